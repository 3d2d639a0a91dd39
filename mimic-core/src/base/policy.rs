//! Policy.
use super::Space;
use crate::{normalize::RunningMeanStd, Mat};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Shape metadata of a policy.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PolicyMeta {
    /// Observation space.
    pub ob_space: Space,

    /// Action space.
    pub ac_space: Space,

    /// The number of environments the policy acts on at once.
    pub n_env: usize,

    /// The number of steps per environment in a batch.
    pub n_steps: usize,

    /// `n_env * n_steps`.
    pub n_batch: usize,
}

impl PolicyMeta {
    /// Metadata of a policy acting one step at a time on `n_env` environments.
    pub fn new(ob_space: Space, ac_space: Space, n_env: usize) -> Self {
        Self {
            ob_space,
            ac_space,
            n_env,
            n_steps: 1,
            n_batch: n_env,
        }
    }
}

/// Arguments of [`Policy::step`] and [`Policy::proba_step`] other than the observation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepArgs {
    /// Recurrent state, if the policy is recurrent.
    pub state: Option<Mat>,

    /// Episode-start mask, one flag per row of the observation.
    pub mask: Option<Vec<bool>>,

    /// If `true`, take the most likely action instead of sampling.
    pub deterministic: bool,
}

impl StepArgs {
    /// Arguments for deterministic action selection.
    pub fn deterministic() -> Self {
        Self {
            deterministic: true,
            ..Self::default()
        }
    }
}

/// Output of [`Policy::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput {
    /// Actions, one per row.
    pub actions: Mat,

    /// Value estimates, one per row.
    pub values: Vec<f32>,

    /// Next recurrent state.
    pub states: Option<Mat>,

    /// Negative log-probability of the actions.
    pub neglogp: Vec<f32>,
}

/// Parameters of the action distribution returned by [`Policy::proba_step`].
#[derive(Clone, Debug, PartialEq)]
pub enum ActionDistribution {
    /// Probabilities of each discrete action, one row per observation.
    Categorical(Mat),

    /// Diagonal Gaussian.
    DiagGaussian {
        /// Means, one row per observation.
        mean: Mat,
        /// Standard deviations, one row per observation.
        std: Mat,
    },

    /// Uniform distribution over a box.
    Uniform {
        /// Lower bounds.
        low: Vec<f32>,
        /// Upper bounds.
        high: Vec<f32>,
    },

    /// Point mass on the given actions.
    Deterministic(Mat),
}

/// A policy on an environment.
///
/// Policy is a mapping from an observation (and an optional recurrent state) to an
/// action and auxiliary outputs.
pub trait Policy {
    /// Takes a step given a batch of observations.
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput>;

    /// Returns the parameters of the action distribution given a batch of observations.
    fn proba_step(&mut self, obs: &Mat, args: &StepArgs) -> Result<ActionDistribution>;

    /// Shape metadata.
    fn meta(&self) -> &PolicyMeta;

    /// Observation statistics applied before the policy sees an observation, if any.
    fn normalization(&self) -> Option<&RunningMeanStd> {
        None
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput> {
        (**self).step(obs, args)
    }

    fn proba_step(&mut self, obs: &Mat, args: &StepArgs) -> Result<ActionDistribution> {
        (**self).proba_step(obs, args)
    }

    fn meta(&self) -> &PolicyMeta {
        (**self).meta()
    }

    fn normalization(&self) -> Option<&RunningMeanStd> {
        (**self).normalization()
    }
}
