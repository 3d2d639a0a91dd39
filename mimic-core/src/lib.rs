#![warn(missing_docs)]
//! Policies, observation normalization and policy serialization.
//!
//! A trained policy is stored as a *policy artifact*, a directory holding a model
//! checkpoint and, optionally, the running-average statistics that were used to
//! normalize observations during training. [`save_policy`] writes such a directory
//! and [`load_policy`] reads it back, wrapping the policy in [`NormalizePolicy`]
//! whenever statistics are found.
//!
//! ```no_run
//! use mimic_core::{load_policy, EnvSpec, Policy, Space, StepArgs, Mat};
//!
//! # fn main() -> anyhow::Result<()> {
//! let env = EnvSpec::new(Space::boxed(vec![-1.0; 4], vec![1.0; 4]), Space::discrete(2));
//! let mut policy = load_policy("ppo2", "output/expert/cartpole_0/policies/final", &env)?;
//! let obs = Mat::from_rows(&[vec![0.0, 0.1, 0.0, -0.1]]);
//! let out = policy.step(&obs, &StepArgs::default())?;
//! println!("{:?}", out.actions);
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod model;
pub mod normalize;
pub mod policies;
pub mod rollout;
mod serialize;

mod base;
pub use base::{ActionDistribution, Env, EnvSpec, Policy, PolicyMeta, Space, StepArgs, StepOutput};

mod mat;
pub use mat::Mat;

pub use error::MimicError;
pub use normalize::{ObsNormalizer, ObsNormalizerConfig, RunningMeanStd};
pub use policies::{MlpPolicy, MlpPolicyConfig, NormalizePolicy, RandomPolicy, ZeroPolicy};
pub use serialize::{
    load_policy, save_policy, PolicyLoaderFn, PolicyRegistry, MODEL_FILE_NAME,
};
