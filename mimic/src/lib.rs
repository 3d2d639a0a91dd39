//! Adversarial imitation learning experiments.
//!
//! This crate holds the configuration of the `train_adversarial` experiment, with its
//! defaults and named variants, and the driver of a training run. The algorithm is
//! provided by the caller as an [`AdversarialTrainer`].
//!
//! ```no_run
//! use mimic::config::{train_adversarial, MergeMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = train_adversarial::resolve(
//!     &["airl", "half_cheetah"],
//!     None,
//!     &["n_epochs=10"],
//!     MergeMode::Shallow,
//! )?;
//! println!("{}", serde_yaml::to_string(&config)?);
//! # Ok(())
//! # }
//! ```
pub mod config;
mod error;
pub mod train_adversarial;
pub mod util;
pub use error::ConfigError;
pub use train_adversarial::{train, train_observed, AdversarialTrainer, TrainResults, TrainerInit};
