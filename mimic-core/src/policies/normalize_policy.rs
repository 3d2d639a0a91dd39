use crate::{
    normalize::RunningMeanStd, ActionDistribution, Mat, ObsNormalizer, Policy, PolicyMeta,
    StepArgs, StepOutput,
};
use anyhow::Result;

/// Wraps a policy, normalizing its input observations.
///
/// A policy trained on normalized observations must see observations on the same
/// scale after it is loaded. The statistics are restored together with the policy by
/// [`load_policy`](crate::load_policy), so users of a saved policy do not need to know
/// whether normalization was used.
///
/// The statistics are only read. This wrapper cannot be used for fine-tuning.
pub struct NormalizePolicy {
    policy: Box<dyn Policy>,
    normalizer: ObsNormalizer,
    meta: PolicyMeta,
}

impl NormalizePolicy {
    /// Wraps `policy`; its metadata is copied.
    pub fn new(policy: Box<dyn Policy>, normalizer: ObsNormalizer) -> Self {
        let meta = policy.meta().clone();
        Self {
            policy,
            normalizer,
            meta,
        }
    }

    /// The normalizer applied to observations.
    pub fn normalizer(&self) -> &ObsNormalizer {
        &self.normalizer
    }

    /// The wrapped policy.
    pub fn inner(&self) -> &dyn Policy {
        self.policy.as_ref()
    }
}

impl Policy for NormalizePolicy {
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput> {
        let obs = self.normalizer.normalize_obs(obs)?;
        self.policy.step(&obs, args)
    }

    fn proba_step(&mut self, obs: &Mat, args: &StepArgs) -> Result<ActionDistribution> {
        let obs = self.normalizer.normalize_obs(obs)?;
        self.policy.proba_step(&obs, args)
    }

    fn meta(&self) -> &PolicyMeta {
        &self.meta
    }

    fn normalization(&self) -> Option<&RunningMeanStd> {
        Some(self.normalizer.obs_rms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MlpPolicy, MlpPolicyConfig, ObsNormalizerConfig, Space};

    #[test]
    fn test_observations_are_normalized_before_delegation() -> Result<()> {
        let config = MlpPolicyConfig::default();
        let mlp = MlpPolicy::new(Space::unbounded(2), Space::discrete(2), &config);
        let mut normalizer = ObsNormalizer::new(2, ObsNormalizerConfig::default());
        normalizer.observe(&Mat::from_rows(&[vec![10.0, -5.0], vec![30.0, 5.0]]))?;

        let obs = Mat::from_rows(&[vec![25.0, 1.0]]);
        let expected = mlp.forward_pi(&normalizer.normalize_obs(&obs)?)?;

        let mut policy = NormalizePolicy::new(Box::new(mlp), normalizer.clone());
        let dist = policy.proba_step(&obs, &StepArgs::default())?;
        match dist {
            ActionDistribution::Categorical(p) => {
                let max = expected.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                let sum: f32 = expected.data.iter().map(|v| (v - max).exp()).sum();
                let p0 = (expected.data[0] - max).exp() / sum;
                assert!((p.data[0] - p0).abs() < 1e-6);
            }
            d => panic!("Unexpected distribution: {:?}", d),
        }

        let state = Mat::from_rows(&[vec![3.0]]);
        let args = StepArgs {
            state: Some(state.clone()),
            ..StepArgs::deterministic()
        };
        let out = policy.step(&obs, &args)?;
        assert_eq!(out.states, Some(state));

        // Statistics are untouched by inference.
        assert_eq!(policy.normalizer(), &normalizer);
        assert_eq!(policy.meta(), policy.inner().meta());
        Ok(())
    }
}
