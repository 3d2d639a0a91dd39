//! Environment.
use super::Space;
use serde::{Deserialize, Serialize};

/// Handle to an environment, or a vector of environments sharing the same spaces.
///
/// Only the space definitions are needed to reconstruct a policy; stepping the
/// environment is the business of the simulator this crate is used with.
pub trait Env {
    /// Observation space of a single environment.
    fn observation_space(&self) -> &Space;

    /// Action space of a single environment.
    fn action_space(&self) -> &Space;

    /// The number of environments stepped in parallel.
    fn num_envs(&self) -> usize {
        1
    }
}

/// Plain description of an environment.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EnvSpec {
    /// Observation space.
    pub observation_space: Space,

    /// Action space.
    pub action_space: Space,

    /// The number of parallel environments.
    pub num_envs: usize,
}

impl EnvSpec {
    /// A single environment with the given spaces.
    pub fn new(observation_space: Space, action_space: Space) -> Self {
        Self {
            observation_space,
            action_space,
            num_envs: 1,
        }
    }

    /// Sets the number of parallel environments.
    pub fn num_envs(mut self, v: usize) -> Self {
        self.num_envs = v;
        self
    }
}

impl Env for EnvSpec {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn num_envs(&self) -> usize {
        self.num_envs
    }
}
