//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// A result directory was found inside another result directory.
    #[error("Result directory {child:?} is nested in result directory {parent:?}")]
    NestedResultDirs {
        /// The outer directory.
        parent: PathBuf,
        /// The inner directory.
        child: PathBuf,
    },

    /// The observer has already started a run.
    #[error("Observer already started a run in {0:?}")]
    AlreadyStarted(PathBuf),

    /// The observer has not started a run.
    #[error("Observer has not started a run")]
    NotStarted,
}
