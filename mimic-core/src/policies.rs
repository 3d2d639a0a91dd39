//! Built-in policies.
mod hard_coded;
mod mlp;
mod normalize_policy;
pub use hard_coded::{RandomPolicy, ZeroPolicy};
pub use mlp::{MlpPolicy, MlpPolicyConfig};
pub use normalize_policy::NormalizePolicy;

use crate::{Mat, MimicError, PolicyMeta};
use anyhow::Result;

/// Checks that `obs` has one column per dimension of the observation space.
fn check_obs(meta: &PolicyMeta, obs: &Mat) -> Result<()> {
    let dim = meta.ob_space.flat_dim();
    if obs.cols() != dim {
        return Err(MimicError::ShapeMismatch(format!(
            "observation with {} columns, observation space has dimension {}",
            obs.cols(),
            dim
        ))
        .into());
    }
    Ok(())
}
