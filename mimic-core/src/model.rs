//! Trained models and their checkpoints.
//!
//! A trained model bundles the hyperparameters of the algorithm that produced it with
//! the networks it learned. Only one of those networks is needed for inference; the
//! loaders in [`PolicyRegistry`](crate::PolicyRegistry) extract it with
//! [`TrainedModel::into_policy`].
mod ppo1;
mod ppo2;
use crate::{Env, MimicError, Policy, Space};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, path::Path};
pub use ppo1::{Ppo1Config, Ppo1Model};
pub use ppo2::{Ppo2Config, Ppo2Model};

/// A model produced by a training algorithm.
pub trait TrainedModel: Serialize + DeserializeOwned {
    /// Name of the algorithm family, also the key of its loader.
    const ALGO: &'static str;

    /// Observation space the model was trained on.
    fn observation_space(&self) -> &Space;

    /// Action space the model was trained on.
    fn action_space(&self) -> &Space;

    /// Extracts the inference component, acting on `n_env` environments at once.
    fn into_policy(self, n_env: usize) -> Box<dyn Policy>;
}

/// On-disk envelope of a trained model.
#[derive(Debug, Deserialize, Serialize)]
struct Checkpoint<M> {
    algo: String,
    model: M,
}

/// Leading part of [`Checkpoint`].
#[derive(Debug, Deserialize)]
struct CheckpointHeader {
    algo: String,
}

/// Writes `model` to `path`.
pub fn save_model<M: TrainedModel>(path: impl AsRef<Path>, model: &M) -> Result<()> {
    let checkpoint = Checkpoint {
        algo: M::ALGO.to_string(),
        model,
    };
    fs::write(path, bincode::serialize(&checkpoint)?)?;
    Ok(())
}

/// Reads a model from `path`, checking it against the spaces of `env`.
///
/// I/O and decoding errors are returned as they are.
pub fn load_model<M: TrainedModel>(path: impl AsRef<Path>, env: &dyn Env) -> Result<M> {
    let bytes = fs::read(path)?;

    // Trailing bytes are allowed, so the tag can be decoded on its own.
    let header: CheckpointHeader = bincode::deserialize(&bytes)?;
    if header.algo != M::ALGO {
        return Err(MimicError::AlgoMismatch {
            expected: M::ALGO.to_string(),
            found: header.algo,
        }
        .into());
    }

    let checkpoint: Checkpoint<M> = bincode::deserialize(&bytes)?;
    let model = checkpoint.model;
    check_space("observation", model.observation_space(), env.observation_space())?;
    check_space("action", model.action_space(), env.action_space())?;
    Ok(model)
}

fn check_space(what: &'static str, model: &Space, env: &Space) -> Result<()> {
    if model != env {
        return Err(MimicError::SpaceMismatch {
            what,
            model: model.clone(),
            env: env.clone(),
        }
        .into());
    }
    Ok(())
}
