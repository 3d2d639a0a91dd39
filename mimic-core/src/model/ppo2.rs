use super::TrainedModel;
use crate::{Env, MlpPolicy, MlpPolicyConfig, Policy, Space};
use serde::{Deserialize, Serialize};

/// Hyperparameters of PPO with vectorized rollouts and minibatch updates.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Ppo2Config {
    /// Discount factor.
    pub gamma: f32,
    /// Steps per environment and update.
    pub n_steps: usize,
    /// Entropy coefficient.
    pub ent_coef: f32,
    /// Learning rate.
    pub learning_rate: f32,
    /// Value loss coefficient.
    pub vf_coef: f32,
    /// Gradient clipping norm.
    pub max_grad_norm: f32,
    /// GAE parameter.
    pub lam: f32,
    /// Minibatches per update.
    pub nminibatches: usize,
    /// Optimizer epochs per update.
    pub noptepochs: usize,
    /// Clipping range of the surrogate objective.
    pub cliprange: f32,
}

impl Default for Ppo2Config {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            n_steps: 128,
            ent_coef: 0.01,
            learning_rate: 2.5e-4,
            vf_coef: 0.5,
            max_grad_norm: 0.5,
            lam: 0.95,
            nminibatches: 4,
            noptepochs: 4,
            cliprange: 0.2,
        }
    }
}

/// Model trained with [`Ppo2Config`].
///
/// `act_model` is the network used to act in the environment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ppo2Model {
    /// Hyperparameters.
    pub config: Ppo2Config,
    /// Acting network.
    pub act_model: MlpPolicy,
    /// Environment steps taken during training.
    pub num_timesteps: u64,
}

impl Ppo2Model {
    /// Untrained model for the spaces of `env`.
    pub fn new(env: &dyn Env, config: Ppo2Config, policy_config: &MlpPolicyConfig) -> Self {
        let mut act_model = MlpPolicy::new(
            env.observation_space().clone(),
            env.action_space().clone(),
            policy_config,
        );
        act_model.set_n_env(env.num_envs());
        Self {
            config,
            act_model,
            num_timesteps: 0,
        }
    }
}

impl TrainedModel for Ppo2Model {
    const ALGO: &'static str = "ppo2";

    fn observation_space(&self) -> &Space {
        &self.act_model.meta().ob_space
    }

    fn action_space(&self) -> &Space {
        &self.act_model.meta().ac_space
    }

    fn into_policy(self, n_env: usize) -> Box<dyn Policy> {
        let mut policy = self.act_model;
        policy.set_n_env(n_env);
        Box::new(policy)
    }
}
