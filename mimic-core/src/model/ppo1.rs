use super::TrainedModel;
use crate::{Env, MlpPolicy, MlpPolicyConfig, Policy, Space};
use serde::{Deserialize, Serialize};

/// Hyperparameters of PPO with a single process per actor batch.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Ppo1Config {
    /// Discount factor.
    pub gamma: f32,
    /// Environment steps per update.
    pub timesteps_per_actorbatch: usize,
    /// Clipping range of the surrogate objective.
    pub clip_param: f32,
    /// Entropy coefficient.
    pub entcoeff: f32,
    /// Optimizer epochs per update.
    pub optim_epochs: usize,
    /// Optimizer step size.
    pub optim_stepsize: f32,
    /// Minibatch size.
    pub optim_batchsize: usize,
    /// GAE parameter.
    pub lam: f32,
    /// Epsilon of Adam.
    pub adam_epsilon: f32,
}

impl Default for Ppo1Config {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            timesteps_per_actorbatch: 256,
            clip_param: 0.2,
            entcoeff: 0.01,
            optim_epochs: 4,
            optim_stepsize: 1e-3,
            optim_batchsize: 64,
            lam: 0.95,
            adam_epsilon: 1e-5,
        }
    }
}

/// Model trained with [`Ppo1Config`].
///
/// `policy_pi` is the current policy and `old_pi` the policy of the previous update,
/// kept for the clipped surrogate objective.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ppo1Model {
    /// Hyperparameters.
    pub config: Ppo1Config,
    /// Current policy.
    pub policy_pi: MlpPolicy,
    /// Policy before the last update.
    pub old_pi: MlpPolicy,
    /// Environment steps taken during training.
    pub num_timesteps: u64,
}

impl Ppo1Model {
    /// Untrained model for the spaces of `env`.
    pub fn new(env: &dyn Env, config: Ppo1Config, policy_config: &MlpPolicyConfig) -> Self {
        let (ob_space, ac_space) = (env.observation_space(), env.action_space());
        let policy_pi = MlpPolicy::new(ob_space.clone(), ac_space.clone(), policy_config);
        Self {
            config,
            old_pi: policy_pi.clone(),
            policy_pi,
            num_timesteps: 0,
        }
    }
}

impl TrainedModel for Ppo1Model {
    const ALGO: &'static str = "ppo1";

    fn observation_space(&self) -> &Space {
        &self.policy_pi.meta().ob_space
    }

    fn action_space(&self) -> &Space {
        &self.policy_pi.meta().ac_space
    }

    fn into_policy(self, n_env: usize) -> Box<dyn Policy> {
        let mut policy = self.policy_pi;
        policy.set_n_env(n_env);
        Box::new(policy)
    }
}
