//! Core abstractions.
mod env;
mod policy;
mod space;
pub use env::{Env, EnvSpec};
pub use policy::{ActionDistribution, Policy, PolicyMeta, StepArgs, StepOutput};
pub use space::Space;
