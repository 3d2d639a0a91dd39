//! Trajectories and their statistics.
use crate::{Mat, MimicError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A single episode.
///
/// `obs` has one more row than `acts`: the observation after the last action.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Trajectory {
    /// Observations.
    pub obs: Mat,

    /// Actions.
    pub acts: Mat,

    /// Rewards.
    pub rews: Vec<f32>,
}

impl Trajectory {
    /// Episode return.
    pub fn ret(&self) -> f32 {
        self.rews.iter().sum()
    }

    /// Episode length.
    pub fn len(&self) -> usize {
        self.rews.len()
    }

    /// Returns `true` if the episode has no transition.
    pub fn is_empty(&self) -> bool {
        self.rews.is_empty()
    }
}

/// Summary of a set of trajectories.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RolloutStats {
    /// The number of trajectories.
    pub n_traj: usize,

    /// Mean of episode returns.
    pub return_mean: f32,

    /// Standard deviation of episode returns.
    pub return_std: f32,

    /// Minimum of episode returns.
    pub return_min: f32,

    /// Maximum of episode returns.
    pub return_max: f32,

    /// Mean of episode lengths.
    pub len_mean: f32,

    /// Standard deviation of episode lengths.
    pub len_std: f32,
}

fn mean_std(xs: &[f32]) -> (f32, f32) {
    let n = xs.len() as f32;
    let mean = xs.iter().sum::<f32>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
    (mean, var.sqrt())
}

/// Computes [`RolloutStats`]. Fails if `trajs` is empty.
pub fn rollout_stats(trajs: &[Trajectory]) -> Result<RolloutStats> {
    if trajs.is_empty() {
        return Err(MimicError::EmptyTrajectories.into());
    }
    let rets: Vec<f32> = trajs.iter().map(|t| t.ret()).collect();
    let lens: Vec<f32> = trajs.iter().map(|t| t.len() as f32).collect();
    let (return_mean, return_std) = mean_std(&rets);
    let (len_mean, len_std) = mean_std(&lens);

    Ok(RolloutStats {
        n_traj: trajs.len(),
        return_mean,
        return_std,
        return_min: rets.iter().cloned().fold(f32::INFINITY, f32::min),
        return_max: rets.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
        len_mean,
        len_std,
    })
}

/// Reads trajectories written by [`save_trajectories`].
pub fn load_trajectories(path: impl AsRef<Path>) -> Result<Vec<Trajectory>> {
    Ok(bincode::deserialize(&fs::read(path)?)?)
}

/// Writes trajectories, creating the parent directory if needed.
pub fn save_trajectories(path: impl AsRef<Path>, trajs: &[Trajectory]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bincode::serialize(trajs)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn traj(rews: Vec<f32>) -> Trajectory {
        let n = rews.len();
        Trajectory {
            obs: Mat::zeros(n + 1, 2),
            acts: Mat::zeros(n, 1),
            rews,
        }
    }

    #[test]
    fn test_rollout_stats() -> Result<()> {
        let stats = rollout_stats(&[traj(vec![1.0, 1.0]), traj(vec![2.0, 2.0, 2.0, 2.0])])?;
        assert_eq!(stats.n_traj, 2);
        assert_eq!(stats.return_mean, 5.0);
        assert_eq!(stats.return_std, 3.0);
        assert_eq!(stats.return_min, 2.0);
        assert_eq!(stats.return_max, 8.0);
        assert_eq!(stats.len_mean, 3.0);
        assert!(rollout_stats(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_save_load_trajectories() -> Result<()> {
        let dir = TempDir::new("rollout")?;
        let path = dir.path().join("rollouts").join("final.bincode");
        let trajs = vec![traj(vec![0.5]), traj(vec![1.0, -1.0])];
        save_trajectories(&path, &trajs)?;
        assert_eq!(load_trajectories(&path)?, trajs);
        Ok(())
    }
}
