//! Errors in the library.
use crate::Space;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum MimicError {
    /// The policy type is not a key of the registry.
    #[error("Unrecognized policy type '{0}'")]
    UnrecognizedPolicyType(String),

    /// The checkpoint was written by another algorithm family.
    #[error("Checkpoint of algorithm '{found}' cannot be loaded as '{expected}'")]
    AlgoMismatch {
        /// Algorithm family requested by the loader.
        expected: String,
        /// Algorithm family recorded in the checkpoint.
        found: String,
    },

    /// The spaces of a model do not match those of the environment.
    #[error("{what} space mismatch: model has {model:?}, environment has {env:?}")]
    SpaceMismatch {
        /// `"observation"` or `"action"`.
        what: &'static str,
        /// Space recorded in the model.
        model: Space,
        /// Space declared by the environment.
        env: Space,
    },

    /// Matrix or vector shapes are incompatible.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Rollout statistics were requested for an empty set of trajectories.
    #[error("No trajectories given")]
    EmptyTrajectories,
}
