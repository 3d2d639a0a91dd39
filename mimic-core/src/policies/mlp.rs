use super::check_obs;
use crate::{
    ActionDistribution, Mat, MimicError, Policy, PolicyMeta, Space, StepArgs, StepOutput,
};
use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Configuration of [`MlpPolicy`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MlpPolicyConfig {
    /// Units of the hidden layers, shared by the policy and value networks.
    pub hidden: Vec<usize>,

    /// Initial value of the log standard deviation for box action spaces.
    pub log_std_init: f32,

    /// Seed of parameter initialization.
    pub seed: u64,
}

impl Default for MlpPolicyConfig {
    fn default() -> Self {
        Self {
            hidden: vec![64, 64],
            log_std_init: 0.0,
            seed: 42,
        }
    }
}

impl MlpPolicyConfig {
    /// Sets the units of the hidden layers.
    pub fn hidden(mut self, v: Vec<usize>) -> Self {
        self.hidden = v;
        self
    }

    /// Sets the seed of parameter initialization.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct Linear {
    /// `in x out`.
    w: Mat,
    b: Vec<f32>,
}

impl Linear {
    fn new(in_dim: usize, out_dim: usize, rng: &mut SmallRng) -> Self {
        let bound = 1f32 / (in_dim.max(1) as f32).sqrt();
        let data = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-bound..=bound))
            .collect();
        Self {
            w: Mat {
                data,
                shape: [in_dim, out_dim],
            },
            b: vec![0f32; out_dim],
        }
    }

    fn forward(&self, x: &Mat) -> Result<Mat> {
        x.matmul(&self.w)?.add_row(&self.b)
    }
}

fn create_layers(
    in_dim: usize,
    hidden: &[usize],
    out_dim: usize,
    rng: &mut SmallRng,
) -> Vec<Linear> {
    let mut dims = vec![in_dim];
    dims.extend_from_slice(hidden);
    dims.push(out_dim);
    dims.windows(2).map(|d| Linear::new(d[0], d[1], rng)).collect()
}

fn mlp_forward(x: &Mat, layers: &[Linear]) -> Result<Mat> {
    let n_layers = layers.len();
    let mut x = x.clone();
    for (i, layer) in layers.iter().enumerate() {
        x = layer.forward(&x)?;
        if i != n_layers - 1 {
            x = x.relu();
        }
    }
    Ok(x)
}

fn softmax_rows(logits: &Mat) -> Mat {
    let mut data = Vec::with_capacity(logits.data.len());
    for row in logits.iter_rows() {
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = row.iter().map(|v| (v - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        data.extend(exp.iter().map(|e| e / sum));
    }
    Mat {
        data,
        shape: logits.shape,
    }
}

fn default_rng() -> SmallRng {
    SmallRng::from_entropy()
}

/// Actor-critic multilayer perceptron with ReLU activations.
///
/// Discrete action spaces get a softmax head; box action spaces get a Gaussian head
/// whose standard deviation does not depend on the observation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MlpPolicy {
    meta: PolicyMeta,
    pi: Vec<Linear>,
    vf: Vec<Linear>,
    log_std: Vec<f32>,
    #[serde(skip, default = "default_rng")]
    rng: SmallRng,
}

impl MlpPolicy {
    /// Constructs a randomly initialized policy.
    pub fn new(ob_space: Space, ac_space: Space, config: &MlpPolicyConfig) -> Self {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let in_dim = ob_space.flat_dim();
        let (out_dim, log_std) = match &ac_space {
            Space::Discrete { n } => (*n, vec![]),
            Space::Box { low, .. } => (low.len(), vec![config.log_std_init; low.len()]),
        };
        let pi = create_layers(in_dim, &config.hidden, out_dim, &mut rng);
        let vf = create_layers(in_dim, &config.hidden, 1, &mut rng);

        Self {
            meta: PolicyMeta::new(ob_space, ac_space, 1),
            pi,
            vf,
            log_std,
            rng,
        }
    }

    /// Sets the number of environments the policy acts on, one step at a time.
    pub fn set_n_env(&mut self, n_env: usize) {
        self.meta.n_env = n_env;
        self.meta.n_steps = 1;
        self.meta.n_batch = n_env;
    }

    /// Reseeds action sampling.
    pub fn seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Output of the policy network: logits or Gaussian means.
    pub fn forward_pi(&self, obs: &Mat) -> Result<Mat> {
        check_obs(&self.meta, obs)?;
        mlp_forward(obs, &self.pi)
    }

    /// Value estimates, one per row.
    pub fn forward_vf(&self, obs: &Mat) -> Result<Vec<f32>> {
        check_obs(&self.meta, obs)?;
        Ok(mlp_forward(obs, &self.vf)?.data)
    }

    /// Standard deviations of a Gaussian head with `n_act` dimensions.
    fn std(&self, n_act: usize) -> Result<Vec<f32>> {
        if self.log_std.len() != n_act {
            return Err(MimicError::ShapeMismatch(format!(
                "{} standard deviations for {} action dimensions",
                self.log_std.len(),
                n_act
            ))
            .into());
        }
        Ok(self.log_std.iter().map(|v| v.exp()).collect())
    }

    fn sample_categorical(&mut self, probs: &Mat, deterministic: bool) -> (Mat, Vec<f32>) {
        let mut actions = Vec::with_capacity(probs.rows());
        let mut neglogp = Vec::with_capacity(probs.rows());
        for row in probs.iter_rows() {
            let a = if deterministic {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |(ix, m), (i, p)| {
                        if *p > m {
                            (i, *p)
                        } else {
                            (ix, m)
                        }
                    })
                    .0
            } else {
                let u: f32 = self.rng.gen();
                let mut acc = 0f32;
                let mut a = row.len() - 1;
                for (i, p) in row.iter().enumerate() {
                    acc += p;
                    if u < acc {
                        a = i;
                        break;
                    }
                }
                a
            };
            actions.push(a as f32);
            neglogp.push(-row[a].max(f32::MIN_POSITIVE).ln());
        }
        let n = actions.len();
        (
            Mat {
                data: actions,
                shape: [n, 1],
            },
            neglogp,
        )
    }

    fn sample_gaussian(&mut self, mean: &Mat, deterministic: bool) -> Result<(Mat, Vec<f32>)> {
        let d = mean.cols();
        let std = self.std(d)?;
        let log_std_sum: f32 = self.log_std.iter().sum();
        let const_term = 0.5 * (2.0 * std::f32::consts::PI).ln() * d as f32;

        let mut data = Vec::with_capacity(mean.data.len());
        let mut neglogp = Vec::with_capacity(mean.rows());
        for row in mean.iter_rows() {
            let mut sq = 0f32;
            for (j, m) in row.iter().enumerate() {
                let a = if deterministic {
                    *m
                } else {
                    let z: f32 = self.rng.sample(StandardNormal);
                    m + std[j] * z
                };
                sq += ((a - m) / std[j]).powi(2);
                data.push(a);
            }
            neglogp.push(0.5 * sq + const_term + log_std_sum);
        }
        Ok((
            Mat {
                data,
                shape: mean.shape,
            },
            neglogp,
        ))
    }
}

impl Policy for MlpPolicy {
    fn step(&mut self, obs: &Mat, args: &StepArgs) -> Result<StepOutput> {
        let out = self.forward_pi(obs)?;
        let values = self.forward_vf(obs)?;
        let (actions, neglogp) = match self.meta.ac_space {
            Space::Discrete { .. } => {
                self.sample_categorical(&softmax_rows(&out), args.deterministic)
            }
            Space::Box { .. } => self.sample_gaussian(&out, args.deterministic)?,
        };

        Ok(StepOutput {
            actions,
            values,
            states: args.state.clone(),
            neglogp,
        })
    }

    fn proba_step(&mut self, obs: &Mat, _args: &StepArgs) -> Result<ActionDistribution> {
        let out = self.forward_pi(obs)?;
        match self.meta.ac_space {
            Space::Discrete { .. } => Ok(ActionDistribution::Categorical(softmax_rows(&out))),
            Space::Box { .. } => {
                let std = self.std(out.cols())?;
                let std = Mat::from_rows(&vec![std; out.rows()]);
                Ok(ActionDistribution::DiagGaussian { mean: out, std })
            }
        }
    }

    fn meta(&self) -> &PolicyMeta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Mat {
        Mat::from_rows(&[vec![0.1, -0.2, 0.3, 0.0], vec![1.0, 0.5, -1.0, 2.0]])
    }

    #[test]
    fn test_discrete_step() -> Result<()> {
        let config = MlpPolicyConfig::default().hidden(vec![8]);
        let mut policy = MlpPolicy::new(Space::unbounded(4), Space::discrete(3), &config);
        let out = policy.step(&obs(), &StepArgs::deterministic())?;
        assert_eq!(out.actions.shape, [2, 1]);
        assert_eq!(out.values.len(), 2);

        // Deterministic actions are the most probable ones.
        let probs = match policy.proba_step(&obs(), &StepArgs::default())? {
            ActionDistribution::Categorical(p) => p,
            d => panic!("Unexpected distribution: {:?}", d),
        };
        for (i, row) in probs.iter_rows().enumerate() {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            let a = out.actions.data[i] as usize;
            assert!(row.iter().all(|p| *p <= row[a]));
            assert!((out.neglogp[i] + row[a].ln()).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_step() -> Result<()> {
        let ac_space = Space::boxed(vec![-1.0; 2], vec![1.0; 2]);
        let mut policy = MlpPolicy::new(Space::unbounded(4), ac_space, &MlpPolicyConfig::default());
        let mean = policy.forward_pi(&obs())?;
        let out = policy.step(&obs(), &StepArgs::deterministic())?;
        assert_eq!(out.actions, mean);

        policy.seed(1);
        let sampled = policy.step(&obs(), &StepArgs::default())?;
        assert_eq!(sampled.actions.shape, [2, 2]);
        assert_ne!(sampled.actions, mean);
        Ok(())
    }

    #[test]
    fn test_missing_log_std_is_an_error() -> Result<()> {
        let ac_space = Space::boxed(vec![-1.0; 2], vec![1.0; 2]);
        let mut policy = MlpPolicy::new(Space::unbounded(4), ac_space, &MlpPolicyConfig::default());
        policy.log_std.pop();
        for deterministic in [true, false].iter() {
            let args = StepArgs {
                deterministic: *deterministic,
                ..StepArgs::default()
            };
            let err = policy.step(&obs(), &args).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<MimicError>(),
                Some(MimicError::ShapeMismatch(_))
            ));
        }
        assert!(policy.proba_step(&obs(), &StepArgs::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_same_seed_same_parameters() -> Result<()> {
        let config = MlpPolicyConfig::default().seed(7);
        let p1 = MlpPolicy::new(Space::unbounded(4), Space::discrete(2), &config);
        let p2 = MlpPolicy::new(Space::unbounded(4), Space::discrete(2), &config);
        assert_eq!(p1.forward_pi(&obs())?, p2.forward_pi(&obs())?);
        Ok(())
    }
}
