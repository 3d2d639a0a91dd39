//! Run records of mimic experiments.
//!
//! A training run is observed by one or more observers. [`FileStorageObserver`]
//! allocates a numbered directory for each run and writes two JSON documents into it:
//! `config.json`, the resolved configuration, and `run.json`, the status of the run
//! with its start and stop times and its result.
//!
//! The rest of this crate works on those directories after the fact:
//!
//! * [`find_result_dirs`] walks a directory tree and collects run directories.
//! * [`RunDocs::load_from_dir`] reads both documents of a run directory.
//! * [`build_run_symlink`] links the log directory of a run to its run directory.
//! * [`get_nested`] looks up dotted keys like `init_trainer_kwargs.num_vec`.
//!
//! ```no_run
//! use mimic_tracking::{dir_contains_run_jsons, find_result_dirs, get_nested, RunDocs};
//!
//! # fn main() -> anyhow::Result<()> {
//! for dir in find_result_dirs("output/sacred", dir_contains_run_jsons, false)? {
//!     let docs = RunDocs::load_from_dir(&dir)?;
//!     println!("{:?}: {:?}", dir, get_nested(&docs.config, "env_name", "."));
//! }
//! # Ok(())
//! # }
//! ```
mod discovery;
mod error;
mod observer;
mod run;
mod util;
pub use discovery::{dir_contains_run_jsons, find_result_dirs, RunDocs, CONFIG_JSON, RUN_JSON};
pub use error::TrackingError;
pub use observer::{FileStorageObserver, RunStatus};
pub use run::{build_run_symlink, run_dir_from_run, Observer, Run, RUN_SYMLINK_NAME};
pub use util::get_nested;
