//! Load and save policies.
use crate::{
    model::{load_model, save_model, Ppo1Model, Ppo2Model, TrainedModel},
    Env, MimicError, NormalizePolicy, ObsNormalizer, Policy, RandomPolicy, ZeroPolicy,
};
use anyhow::Result;
use log::info;
use std::{collections::HashMap, fs, io, path::Path};

/// File name of the model checkpoint in a policy artifact.
pub const MODEL_FILE_NAME: &str = "model.bincode";

/// Loads a policy stored in a directory, for the given environment.
pub type PolicyLoaderFn = fn(&Path, &dyn Env) -> Result<Box<dyn Policy>>;

fn load_random(_path: &Path, env: &dyn Env) -> Result<Box<dyn Policy>> {
    Ok(Box::new(RandomPolicy::new(
        env.observation_space().clone(),
        env.action_space().clone(),
    )))
}

fn load_zero(_path: &Path, env: &dyn Env) -> Result<Box<dyn Policy>> {
    Ok(Box::new(ZeroPolicy::new(
        env.observation_space().clone(),
        env.action_space().clone(),
    )))
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .map(|e| e.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}

/// Loads a policy trained with the algorithm of `M`.
///
/// The normalization statistics are restored through a normalizer built for `env`;
/// it only holds the statistics and never steps the environment. If the statistics
/// files are absent, normalization was not used during training and the policy is
/// returned unwrapped.
fn load_trained<M: TrainedModel>(path: &Path, env: &dyn Env) -> Result<Box<dyn Policy>> {
    info!("Loading {} policy from {:?}", M::ALGO, path);
    let model: M = load_model(path.join(MODEL_FILE_NAME), env)?;
    let policy = model.into_policy(env.num_envs());

    let mut normalizer = ObsNormalizer::for_env(env, false);
    match normalizer.load_running_average(path) {
        Ok(()) => {
            info!("Loaded normalization statistics from {:?}", path);
            Ok(Box::new(NormalizePolicy::new(policy, normalizer)))
        }
        Err(e) if is_not_found(&e) => Ok(policy),
        Err(e) => Err(e),
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Maps policy types to loader functions.
///
/// The default registry knows the following policy types:
///
/// * `random` - takes random actions, ignores the path.
/// * `zero` - takes the zero action, ignores the path.
/// * `ppo1`, `ppo2` - trained models, see [`TrainedModel`].
///
/// Trained models are loaded as shown below:
///
/// ```mermaid
/// graph LR
///     A["model.bincode"] -->|TrainedModel::into_policy| B[Policy]
///     C["obs_rms.bincode, ret_rms.bincode"] -->|found| D[NormalizePolicy]
///     B --> D
///     C -->|not found| B
/// ```
pub struct PolicyRegistry {
    loaders: HashMap<String, PolicyLoaderFn>,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("random", load_random);
        registry.register("zero", load_zero);
        registry.register(Ppo1Model::ALGO, load_trained::<Ppo1Model>);
        registry.register(Ppo2Model::ALGO, load_trained::<Ppo2Model>);
        registry
    }
}

impl PolicyRegistry {
    /// Registry without any loader.
    pub fn empty() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Registers `loader` for `policy_type`, replacing any previous one.
    pub fn register(&mut self, policy_type: impl Into<String>, loader: PolicyLoaderFn) {
        self.loaders.insert(policy_type.into(), loader);
    }

    /// Returns the loader of `policy_type`.
    pub fn get(&self, policy_type: &str) -> Option<PolicyLoaderFn> {
        self.loaders.get(policy_type).copied()
    }

    /// Registered policy types, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.loaders.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    /// Loads a serialized policy.
    ///
    /// * `policy_type` - a registered key, e.g. `ppo2`.
    /// * `policy_path` - the directory where the policy is stored.
    /// * `env` - the environment the policy is to be used with.
    ///
    /// An unknown `policy_type` fails with [`MimicError::UnrecognizedPolicyType`]
    /// before the filesystem is touched.
    pub fn load_policy(
        &self,
        policy_type: &str,
        policy_path: impl AsRef<Path>,
        env: &dyn Env,
    ) -> Result<Box<dyn Policy>> {
        let loader = self
            .get(policy_type)
            .ok_or_else(|| MimicError::UnrecognizedPolicyType(policy_type.to_string()))?;
        loader(policy_path.as_ref(), env)
    }
}

/// Loads a serialized policy with the default [`PolicyRegistry`].
pub fn load_policy(
    policy_type: &str,
    policy_path: impl AsRef<Path>,
    env: &dyn Env,
) -> Result<Box<dyn Policy>> {
    PolicyRegistry::default().load_policy(policy_type, policy_path, env)
}

/// Saves a trained model as a policy artifact.
///
/// Load it later with `load_policy(M::ALGO, output_dir, env)`. If `normalizer` is given,
/// its statistics are saved as well and the loaded policy is wrapped in
/// [`NormalizePolicy`].
pub fn save_policy<M: TrainedModel>(
    output_dir: impl AsRef<Path>,
    model: &M,
    normalizer: Option<&ObsNormalizer>,
) -> Result<()> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    save_model(output_dir.join(MODEL_FILE_NAME), model)?;
    if let Some(normalizer) = normalizer {
        normalizer.save_running_average(output_dir)?;
    }
    info!("Saved policy to {:?}", output_dir);
    Ok(())
}
