//! Errors in the library.
use thiserror::Error;

/// Errors in experiment configuration and training runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The variant is not defined for the experiment.
    #[error("Unknown variant '{name}', available: {available}")]
    UnknownVariant {
        /// Requested name.
        name: String,
        /// Comma-separated names of the defined variants.
        available: String,
    },

    /// An update is not of the form `key=value`.
    #[error("Invalid update '{0}', expected key=value")]
    InvalidUpdate(String),

    /// A dotted key goes through a value that is not a mapping.
    #[error("Cannot set '{key}': '{at}' is not a mapping")]
    NotAMapping {
        /// The full key of the update.
        key: String,
        /// The prefix of the key holding a non-mapping value.
        at: String,
    },

    /// A configuration file does not hold a mapping at the top level.
    #[error("Configuration file does not hold a mapping")]
    NotAMappingFile,

    /// Fewer expert trajectories are available than requested.
    #[error("Requested {requested} expert demonstrations, only {available} available")]
    NotEnoughDemos {
        /// `n_expert_demos`.
        requested: usize,
        /// Trajectories found in the rollout file.
        available: usize,
    },
}
