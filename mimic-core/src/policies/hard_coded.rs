//! Policies that ignore observations.
//!
//! They report zero values and zero negative log-probabilities.
use super::check_obs;
use crate::{ActionDistribution, Mat, Policy, PolicyMeta, Space, StepArgs, StepOutput};
use anyhow::Result;
use rand::{rngs::SmallRng, SeedableRng};

fn output(actions: Vec<Vec<f32>>, args: &StepArgs) -> StepOutput {
    let n = actions.len();
    StepOutput {
        actions: Mat::from_rows(&actions),
        values: vec![0f32; n],
        states: args.state.clone(),
        neglogp: vec![0f32; n],
    }
}

/// Takes actions sampled uniformly from the action space.
pub struct RandomPolicy {
    meta: PolicyMeta,
    rng: SmallRng,
}

impl RandomPolicy {
    /// Constructs a policy seeded from the operating system.
    pub fn new(ob_space: Space, ac_space: Space) -> Self {
        Self {
            meta: PolicyMeta::new(ob_space, ac_space, 1),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reseeds the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }
}

impl Policy for RandomPolicy {
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput> {
        check_obs(&self.meta, obs)?;
        let mut actions = Vec::with_capacity(obs.rows());
        for _ in 0..obs.rows() {
            actions.push(self.meta.ac_space.sample(&mut self.rng));
        }
        Ok(output(actions, args))
    }

    fn proba_step(&mut self, obs: &Mat, _args: &StepArgs) -> Result<ActionDistribution> {
        check_obs(&self.meta, obs)?;
        Ok(match &self.meta.ac_space {
            Space::Discrete { n } => {
                let p = 1f32 / *n as f32;
                ActionDistribution::Categorical(Mat::from_rows(&vec![vec![p; *n]; obs.rows()]))
            }
            Space::Box { low, high } => ActionDistribution::Uniform {
                low: low.clone(),
                high: high.clone(),
            },
        })
    }

    fn meta(&self) -> &PolicyMeta {
        &self.meta
    }
}

/// Always takes the zero action.
pub struct ZeroPolicy {
    meta: PolicyMeta,
}

impl ZeroPolicy {
    /// Constructs the policy.
    pub fn new(ob_space: Space, ac_space: Space) -> Self {
        Self {
            meta: PolicyMeta::new(ob_space, ac_space, 1),
        }
    }

    fn zeros(&self, rows: usize) -> Vec<Vec<f32>> {
        vec![self.meta.ac_space.zero(); rows]
    }
}

impl Policy for ZeroPolicy {
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput> {
        check_obs(&self.meta, obs)?;
        Ok(output(self.zeros(obs.rows()), args))
    }

    fn proba_step(&mut self, obs: &Mat, _args: &StepArgs) -> Result<ActionDistribution> {
        check_obs(&self.meta, obs)?;
        Ok(ActionDistribution::Deterministic(Mat::from_rows(
            &self.zeros(obs.rows()),
        )))
    }

    fn meta(&self) -> &PolicyMeta {
        &self.meta
    }
}
