//! File storage of run records.
use crate::{TrackingError, CONFIG_JSON, RUN_JSON};
use anyhow::Result;
use chrono::{Local, SecondsFormat};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

/// Status of a run, as written in `run.json`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Started, not finished.
    Running,
    /// Finished normally.
    Completed,
    /// Finished with an error.
    Failed,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct RunRecord {
    status: RunStatus,
    start_time: String,
    stop_time: Option<String>,
    result: Option<Value>,
    fail_trace: Option<String>,
}

fn now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let wtr = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(wtr, value)?;
    Ok(())
}

/// Writes each run into a numbered subdirectory of a base directory.
///
/// Runs are numbered from 1. The run directory holds `config.json` and `run.json`.
#[derive(Clone, Debug)]
pub struct FileStorageObserver {
    basedir: PathBuf,
    dir: Option<PathBuf>,
    record: Option<RunRecord>,
}

impl FileStorageObserver {
    /// Observer writing under `basedir`, which is created on the first run.
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            dir: None,
            record: None,
        }
    }

    /// The base directory.
    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    /// The directory of the current run, if started.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn next_id(&self) -> Result<u64> {
        let mut max = 0;
        for entry in fs::read_dir(&self.basedir)? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) {
                max = max.max(id);
            }
        }
        Ok(max + 1)
    }

    /// Allocates the run directory and writes the configuration and the run record.
    ///
    /// Returns the run id.
    pub fn started(&mut self, config: &Value) -> Result<u64> {
        if let Some(dir) = &self.dir {
            return Err(TrackingError::AlreadyStarted(dir.clone()).into());
        }
        fs::create_dir_all(&self.basedir)?;

        let mut id = self.next_id()?;
        let dir = loop {
            let dir = self.basedir.join(id.to_string());
            match fs::create_dir(&dir) {
                Ok(()) => break dir,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => id += 1,
                Err(e) => return Err(e.into()),
            }
        };

        let record = RunRecord {
            status: RunStatus::Running,
            start_time: now(),
            stop_time: None,
            result: None,
            fail_trace: None,
        };
        write_json(&dir.join(CONFIG_JSON), config)?;
        write_json(&dir.join(RUN_JSON), &record)?;
        info!("Started run {} in {:?}", id, dir);

        self.dir = Some(dir);
        self.record = Some(record);
        Ok(id)
    }

    fn finish(
        &mut self,
        status: RunStatus,
        result: Option<Value>,
        fail_trace: Option<String>,
    ) -> Result<()> {
        let (dir, record) = match (&self.dir, &mut self.record) {
            (Some(dir), Some(record)) => (dir, record),
            _ => return Err(TrackingError::NotStarted.into()),
        };
        record.status = status;
        record.stop_time = Some(now());
        record.result = result;
        record.fail_trace = fail_trace;
        write_json(&dir.join(RUN_JSON), &*record)
    }

    /// Marks the run completed with `result`.
    pub fn completed(&mut self, result: &Value) -> Result<()> {
        self.finish(RunStatus::Completed, Some(result.clone()), None)
    }

    /// Marks the run failed.
    pub fn failed(&mut self, reason: &str) -> Result<()> {
        self.finish(RunStatus::Failed, None, Some(reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunDocs;
    use serde_json::json;
    use tempdir::TempDir;

    #[test]
    fn test_run_lifecycle() -> Result<()> {
        let tmp = TempDir::new("observer")?;
        let basedir = tmp.path().join("sacred").join("train");
        let mut observer = FileStorageObserver::new(&basedir);
        assert_eq!(observer.basedir(), basedir.as_path());
        assert!(observer.completed(&json!({})).is_err());

        let id = observer.started(&json!({"n_epochs": 2}))?;
        assert_eq!(id, 1);
        let dir = observer.dir().map(Path::to_path_buf);
        assert_eq!(dir, Some(basedir.join("1")));
        assert!(observer.started(&json!({})).is_err());

        let docs = RunDocs::load_from_dir(basedir.join("1"))?;
        assert_eq!(docs.config, json!({"n_epochs": 2}));
        assert_eq!(docs.run["status"], "RUNNING");
        assert!(docs.run["stop_time"].is_null());

        observer.completed(&json!({"return_mean": 1.5}))?;
        let docs = RunDocs::load_from_dir(basedir.join("1"))?;
        assert_eq!(docs.run["status"], "COMPLETED");
        assert_eq!(docs.run["result"]["return_mean"], 1.5);
        assert!(docs.run["stop_time"].is_string());
        Ok(())
    }

    #[test]
    fn test_ids_increase() -> Result<()> {
        let tmp = TempDir::new("observer")?;
        fs::create_dir_all(tmp.path().join("7"))?;
        fs::create_dir_all(tmp.path().join("_sources"))?;

        let mut observer = FileStorageObserver::new(tmp.path());
        assert_eq!(observer.started(&json!({}))?, 8);
        observer.failed("diverged")?;
        let docs = RunDocs::load_from_dir(tmp.path().join("8"))?;
        assert_eq!(docs.run["status"], "FAILED");
        assert_eq!(docs.run["fail_trace"], "diverged");

        let mut observer = FileStorageObserver::new(tmp.path());
        assert_eq!(observer.started(&json!({}))?, 9);
        Ok(())
    }
}
