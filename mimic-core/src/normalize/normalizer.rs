use super::RunningMeanStd;
use crate::{Env, Mat, MimicError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// File name of the observation statistics in a policy artifact.
pub const OBS_RMS_FILE_NAME: &str = "obs_rms.bincode";

/// File name of the return statistics in a policy artifact.
pub const RET_RMS_FILE_NAME: &str = "ret_rms.bincode";

/// Configuration of [`ObsNormalizer`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ObsNormalizerConfig {
    /// If `true`, [`ObsNormalizer::observe`] updates the statistics.
    pub training: bool,

    /// Normalize observations.
    pub norm_obs: bool,

    /// Normalize rewards.
    pub norm_reward: bool,

    /// Normalized observations are clipped to `[-clip_obs, clip_obs]`.
    pub clip_obs: f32,

    /// Normalized rewards are clipped to `[-clip_reward, clip_reward]`.
    pub clip_reward: f32,

    /// Discount factor of the returns whose statistics scale rewards.
    pub gamma: f32,

    /// Added to the variance to avoid division by zero.
    pub epsilon: f64,
}

impl Default for ObsNormalizerConfig {
    fn default() -> Self {
        Self {
            training: true,
            norm_obs: true,
            norm_reward: true,
            clip_obs: 10.0,
            clip_reward: 10.0,
            gamma: 0.99,
            epsilon: 1e-8,
        }
    }
}

impl ObsNormalizerConfig {
    /// Sets the training flag.
    pub fn training(mut self, v: bool) -> Self {
        self.training = v;
        self
    }

    /// Sets whether observations are normalized.
    pub fn norm_obs(mut self, v: bool) -> Self {
        self.norm_obs = v;
        self
    }

    /// Sets whether rewards are normalized.
    pub fn norm_reward(mut self, v: bool) -> Self {
        self.norm_reward = v;
        self
    }

    /// Sets the clipping range of normalized observations.
    pub fn clip_obs(mut self, v: f32) -> Self {
        self.clip_obs = v;
        self
    }

    /// Sets the clipping range of normalized rewards.
    pub fn clip_reward(mut self, v: f32) -> Self {
        self.clip_reward = v;
        self
    }
}

/// Normalizes observations and rewards with running-average statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct ObsNormalizer {
    obs_rms: RunningMeanStd,
    ret_rms: RunningMeanStd,
    config: ObsNormalizerConfig,
}

impl ObsNormalizer {
    /// Fresh statistics for observations of dimension `obs_dim`.
    pub fn new(obs_dim: usize, config: ObsNormalizerConfig) -> Self {
        Self {
            obs_rms: RunningMeanStd::new(obs_dim),
            ret_rms: RunningMeanStd::new(1),
            config,
        }
    }

    /// Fresh statistics for the observation space of `env`.
    ///
    /// The environment is only consulted for its spaces.
    pub fn for_env(env: &dyn Env, training: bool) -> Self {
        let config = ObsNormalizerConfig::default().training(training);
        Self::new(env.observation_space().flat_dim(), config)
    }

    /// Observation statistics.
    pub fn obs_rms(&self) -> &RunningMeanStd {
        &self.obs_rms
    }

    /// Return statistics.
    pub fn ret_rms(&self) -> &RunningMeanStd {
        &self.ret_rms
    }

    /// Configuration.
    pub fn config(&self) -> &ObsNormalizerConfig {
        &self.config
    }

    /// Normalizes a batch of observations, one per row.
    ///
    /// `(obs - mean) / sqrt(var + epsilon)`, clipped to `[-clip_obs, clip_obs]`.
    /// The statistics are not modified.
    pub fn normalize_obs(&self, obs: &Mat) -> Result<Mat> {
        if !self.config.norm_obs {
            return Ok(obs.clone());
        }
        if obs.cols() != self.obs_rms.dim() {
            return Err(MimicError::ShapeMismatch(format!(
                "observation with {} columns for statistics of dimension {}",
                obs.cols(),
                self.obs_rms.dim()
            ))
            .into());
        }

        let clip = self.config.clip_obs as f64;
        let std = self.obs_rms.std(self.config.epsilon);
        let c = obs.cols();
        let data = obs
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let j = i % c;
                ((*v as f64 - self.obs_rms.mean[j]) / std[j]).max(-clip).min(clip) as f32
            })
            .collect();
        Mat::new(data, obs.shape)
    }

    /// Scales a reward by the standard deviation of the returns, then clips it.
    pub fn normalize_reward(&self, reward: f32) -> f32 {
        if !self.config.norm_reward {
            return reward;
        }
        let std = self.ret_rms.std(self.config.epsilon)[0];
        let clip = self.config.clip_reward as f64;
        (reward as f64 / std).max(-clip).min(clip) as f32
    }

    /// Updates the observation statistics in training mode; otherwise does nothing.
    pub fn observe(&mut self, obs: &Mat) -> Result<()> {
        if self.config.training {
            self.obs_rms.update(obs)?;
        }
        Ok(())
    }

    /// Updates the return statistics in training mode; otherwise does nothing.
    pub fn observe_returns(&mut self, returns: &[f32]) -> Result<()> {
        if self.config.training {
            let batch = Mat::new(returns.to_vec(), [returns.len(), 1])?;
            self.ret_rms.update(&batch)?;
        }
        Ok(())
    }

    /// Writes the statistics into `dir`.
    pub fn save_running_average(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::write(dir.join(OBS_RMS_FILE_NAME), bincode::serialize(&self.obs_rms)?)?;
        fs::write(dir.join(RET_RMS_FILE_NAME), bincode::serialize(&self.ret_rms)?)?;
        Ok(())
    }

    /// Reads the statistics from `dir`.
    ///
    /// If either file is missing, the error is the [`std::io::Error`] of kind
    /// [`NotFound`](std::io::ErrorKind::NotFound) and `self` is left untouched.
    /// Statistics of the wrong dimension are a [`MimicError::ShapeMismatch`].
    pub fn load_running_average(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let obs_rms = read_rms(&dir.join(OBS_RMS_FILE_NAME))?;
        let ret_rms = read_rms(&dir.join(RET_RMS_FILE_NAME))?;
        check_rms(OBS_RMS_FILE_NAME, &obs_rms, self.obs_rms.dim())?;
        check_rms(RET_RMS_FILE_NAME, &ret_rms, 1)?;
        self.obs_rms = obs_rms;
        self.ret_rms = ret_rms;
        Ok(())
    }
}

fn read_rms(path: &Path) -> Result<RunningMeanStd> {
    Ok(bincode::deserialize(&fs::read(path)?)?)
}

fn check_rms(name: &str, rms: &RunningMeanStd, dim: usize) -> Result<()> {
    if rms.mean.len() != dim || rms.var.len() != dim {
        return Err(MimicError::ShapeMismatch(format!(
            "{}: mean of length {} and variance of length {}, expected {}",
            name,
            rms.mean.len(),
            rms.var.len(),
            dim
        ))
        .into());
    }
    Ok(())
}
