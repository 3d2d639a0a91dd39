//! Runs and their observers.
use crate::FileStorageObserver;
use anyhow::Result;
use log::{info, warn};
use serde_json::Value;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Name of the link from a log directory to its run directory.
pub const RUN_SYMLINK_NAME: &str = "sacred";

/// An observer attached to a [`Run`].
#[derive(Clone, Debug)]
pub enum Observer {
    /// Writes run records to the local filesystem.
    FileStorage(FileStorageObserver),

    /// An observer without local storage, identified by name.
    Other(String),
}

/// A run of an experiment.
#[derive(Clone, Debug, Default)]
pub struct Run {
    /// Run id assigned by the first file-storage observer, once started.
    pub id: Option<u64>,

    /// Observers notified of the run.
    pub observers: Vec<Observer>,
}

impl Run {
    /// A run with the given observers.
    pub fn new(observers: Vec<Observer>) -> Self {
        Self { id: None, observers }
    }

    fn file_storages(&mut self) -> impl Iterator<Item = &mut FileStorageObserver> {
        self.observers.iter_mut().filter_map(|o| match o {
            Observer::FileStorage(fs) => Some(fs),
            Observer::Other(_) => None,
        })
    }

    /// Notifies the observers that the run started with `config`.
    pub fn start(&mut self, config: &Value) -> Result<()> {
        let mut id = None;
        for observer in self.file_storages() {
            let i = observer.started(config)?;
            id = id.or(Some(i));
        }
        self.id = id;
        Ok(())
    }

    /// Notifies the observers that the run completed with `result`.
    pub fn complete(&mut self, result: &Value) -> Result<()> {
        for observer in self.file_storages() {
            observer.completed(result)?;
        }
        Ok(())
    }

    /// Notifies the observers that the run failed.
    pub fn fail(&mut self, reason: &str) -> Result<()> {
        for observer in self.file_storages() {
            observer.failed(reason)?;
        }
        Ok(())
    }
}

/// Directory of the first file-storage observer of `run`, if any has started.
pub fn run_dir_from_run(run: &Run) -> Option<&Path> {
    run.observers.iter().find_map(|o| match o {
        Observer::FileStorage(fs) => fs.dir(),
        Observer::Other(_) => None,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Creates the link `<log_dir>/sacred` pointing to the absolute run directory.
///
/// If `run` has no file-storage observer, a warning is logged and nothing is created.
/// An existing entry at the link path is an error.
pub fn build_run_symlink(log_dir: impl AsRef<Path>, run: &Run) -> Result<()> {
    let run_dir = match run_dir_from_run(run) {
        Some(dir) => dir,
        None => {
            warn!("Couldn't find run directory, skip creating the link");
            return Ok(());
        }
    };
    let link = log_dir.as_ref().join(RUN_SYMLINK_NAME);
    symlink_dir(&absolute(run_dir)?, &link)?;
    info!("Linked {:?} to {:?}", link, run_dir);
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{fs, io};
    use tempdir::TempDir;

    #[test]
    fn test_run_dir_from_run() -> Result<()> {
        let tmp = TempDir::new("run")?;
        let mut run = Run::new(vec![
            Observer::Other("mongo".to_string()),
            Observer::FileStorage(FileStorageObserver::new(tmp.path().join("a"))),
            Observer::FileStorage(FileStorageObserver::new(tmp.path().join("b"))),
        ]);
        assert!(run_dir_from_run(&run).is_none());

        run.start(&json!({}))?;
        assert_eq!(run.id, Some(1));
        let dir = run_dir_from_run(&run).map(Path::to_path_buf);
        assert_eq!(dir, Some(tmp.path().join("a").join("1")));
        Ok(())
    }

    #[test]
    fn test_symlink() -> Result<()> {
        let tmp = TempDir::new("run")?;
        let log_dir = tmp.path().join("log");
        fs::create_dir_all(&log_dir)?;
        let mut run = Run::new(vec![Observer::FileStorage(FileStorageObserver::new(
            tmp.path().join("sacred"),
        ))]);
        run.start(&json!({"seed": 0}))?;

        build_run_symlink(&log_dir, &run)?;
        let link = log_dir.join(RUN_SYMLINK_NAME);
        assert!(fs::symlink_metadata(&link)?.file_type().is_symlink());
        assert_eq!(fs::read_link(&link)?, tmp.path().join("sacred").join("1"));
        assert!(link.join("config.json").is_file());

        let err = build_run_symlink(&log_dir, &run).unwrap_err();
        let kind = err.downcast_ref::<io::Error>().map(|e| e.kind());
        assert_eq!(kind, Some(io::ErrorKind::AlreadyExists));
        Ok(())
    }

    #[test]
    fn test_no_file_storage() -> Result<()> {
        let tmp = TempDir::new("run")?;
        let run = Run::new(vec![Observer::Other("mongo".to_string())]);
        build_run_symlink(tmp.path(), &run)?;
        assert!(!tmp.path().join(RUN_SYMLINK_NAME).exists());
        Ok(())
    }
}
