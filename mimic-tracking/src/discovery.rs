//! Discovery and loading of run directories.
use crate::TrackingError;
use anyhow::Result;
use log::warn;
use serde_json::Value;
use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

/// File name of the run document.
pub const RUN_JSON: &str = "run.json";

/// File name of the configuration document.
pub const CONFIG_JSON: &str = "config.json";

/// Returns `true` if both `run.json` and `config.json` are regular files in `dir`.
pub fn dir_contains_run_jsons(dir: &Path) -> bool {
    dir.join(RUN_JSON).is_file() && dir.join(CONFIG_JSON).is_file()
}

fn walk<F: Fn(&Path) -> bool>(
    dir: &Path,
    is_result_dir: &F,
    found: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    if is_result_dir(dir) {
        found.insert(dir.to_path_buf());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // `DirEntry::file_type` does not traverse symlinks.
        if entry.file_type()?.is_dir() {
            let path = entry.path();
            if let Err(e) = walk(&path, is_result_dir, found) {
                warn!("Skipped unreadable directory {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}

/// Walks the tree under `root` and returns the directories matching `is_result_dir`.
///
/// `root` itself is a candidate. Symbolic links are not followed. If `root` is not a
/// directory, the result is empty. An error reading `root` is returned, while
/// subdirectories that cannot be read are skipped with a warning.
///
/// Unless `nested_ok` is set, a matched directory inside another matched directory is
/// an error, [`TrackingError::NestedResultDirs`].
pub fn find_result_dirs<F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    is_result_dir: F,
    nested_ok: bool,
) -> Result<BTreeSet<PathBuf>> {
    let root = root.as_ref();
    let mut found = BTreeSet::new();
    if !root.is_dir() {
        return Ok(found);
    }
    walk(root, &is_result_dir, &mut found)?;

    if !nested_ok {
        for child in found.iter() {
            if let Some(parent) = child.ancestors().skip(1).find(|p| found.contains(*p)) {
                return Err(TrackingError::NestedResultDirs {
                    parent: parent.to_path_buf(),
                    child: child.clone(),
                }
                .into());
            }
        }
    }
    Ok(found)
}

/// The documents of a run directory.
#[derive(Clone, Debug, PartialEq)]
pub struct RunDocs {
    /// The run directory.
    pub dir: PathBuf,

    /// Contents of `config.json`.
    pub config: Value,

    /// Contents of `run.json`.
    pub run: Value,
}

fn read_json(path: &Path) -> Result<Value> {
    let rdr = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(rdr)?)
}

impl RunDocs {
    /// Reads `config.json` and `run.json` in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            dir: dir.to_path_buf(),
            config: read_json(&dir.join(CONFIG_JSON))?,
            run: read_json(&dir.join(RUN_JSON))?,
        })
    }
}
