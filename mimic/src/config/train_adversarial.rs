//! Configuration of [`train`](crate::train_adversarial::train).
use super::{apply_updates, merge, ConfigMap, ConfigSet, MergeMode};
use crate::util::make_unique_timestamp;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Name of the experiment.
pub const EXPERIMENT_NAME: &str = "train_adversarial";

fn map(value: Value) -> ConfigMap {
    match value {
        Value::Object(m) => m,
        _ => ConfigMap::new(),
    }
}

/// Default configuration.
pub fn defaults() -> ConfigMap {
    map(json!({
        // Environment to train on
        "env_name": "CartPole-v1",
        "n_epochs": 50,
        // null uses every available demonstration
        "n_expert_demos": null,
        // Episodes for the final mean ground-truth return
        "n_episodes_eval": 50,
        "n_disc_steps_per_epoch": 50,
        "n_gen_steps_per_epoch": 2048,
        "airl_entropy_weight": 1.0,

        // Epochs between plots, <= 0 disables
        "plot_interval": -1,
        "n_plot_episodes": 5,
        "show_plots": true,

        "init_trainer_kwargs": {
            // Changing this also changes the effective n_steps
            "num_vec": 8,
            "parallel": true,
            // Positive to limit episode horizons
            "max_episode_steps": null,
            "scale": true,
            "reward_kwargs": {
                "theta_units": [32, 32],
                "phi_units": [32, 32],
            },
            "trainer_kwargs": {
                "n_disc_samples_per_buffer": 1000,
                // Equal to n_disc_samples_per_buffer, the replay buffer is effectively off
                "gen_replay_buffer_capacity": 1000,
            },
            "init_rl_kwargs": {
                "policy_class": "FeedForward32Policy",
                "learning_rate": 3e-4,
                "nminibatches": 32,
                "noptepochs": 10,
                "n_steps": 2048,
            },
        },

        "log_root": "output/train_adversarial",
        // Epochs between checkpoints, <= 0 disables
        "checkpoint_interval": 5,
        "init_tensorboard": false,
        // Used to derive rollout_path
        "rollout_hint": null,
    }))
}

fn env_variant(env_name: &str, rollout_hint: &str) -> ConfigMap {
    map(json!({"env_name": env_name, "rollout_hint": rollout_hint}))
}

fn with(mut patch: ConfigMap, extra: ConfigMap) -> ConfigMap {
    merge(&mut patch, &extra, MergeMode::Shallow);
    patch
}

fn ant_shared() -> ConfigMap {
    map(json!({
        "n_epochs": 2000,
        "init_trainer_kwargs": {
            // Batch of 2048 * 8 = 16384 with the default num_vec
            "init_rl_kwargs": {"n_steps": 2048},
            "max_episode_steps": 500,
        },
    }))
}

/// Defaults and named variants.
pub fn config_set() -> ConfigSet {
    ConfigSet::new(EXPERIMENT_NAME, defaults())
        // Algorithms
        .variant("gail", "Train with GAIL", map(json!({"init_trainer_kwargs": {"use_gail": true}})))
        .variant(
            "airl",
            "Train with AIRL",
            map(json!({"init_trainer_kwargs": {"use_gail": false}})),
        )
        .variant("plots", "Plot every 10 epochs", map(json!({"plot_interval": 10})))
        // Environments
        .variant("acrobot", "Acrobot-v1", env_variant("Acrobot-v1", "acrobot"))
        .variant("ant", "Ant-v2", with(env_variant("Ant-v2", "ant"), ant_shared()))
        .variant(
            "cartpole",
            "CartPole-v1 without reward scaling",
            with(
                env_variant("CartPole-v1", "cartpole"),
                map(json!({"init_trainer_kwargs": {"scale": false}})),
            ),
        )
        .variant(
            "half_cheetah",
            "HalfCheetah-v2",
            with(
                env_variant("HalfCheetah-v2", "half_cheetah"),
                map(json!({
                    "n_epochs": 1000,
                    "init_trainer_kwargs": {"airl_entropy_weight": 0.1},
                })),
            ),
        )
        .variant("hopper", "Hopper-v2", env_variant("Hopper-v2", "hopper"))
        .variant(
            "humanoid",
            "Humanoid-v2",
            with(env_variant("Humanoid-v2", "humanoid"), map(json!({"n_epochs": 2000}))),
        )
        .variant("mountain_car", "MountainCar-v0", env_variant("MountainCar-v0", "mountain_car"))
        .variant("pendulum", "Pendulum-v0", env_variant("Pendulum-v0", "pendulum"))
        .variant("reacher", "Reacher-v2", env_variant("Reacher-v2", "reacher"))
        .variant(
            "swimmer",
            "Swimmer-v2 with an MLP policy network",
            with(
                env_variant("Swimmer-v2", "swimmer"),
                map(json!({
                    "n_epochs": 1000,
                    "init_trainer_kwargs": {
                        "init_rl_kwargs": {"policy_network_class": "MlpPolicy"},
                    },
                })),
            ),
        )
        .variant("walker", "Walker2d-v2", env_variant("Walker2d-v2", "walker"))
        // Custom environments
        .variant(
            "two_d_maze",
            "imitation/TwoDMaze-v0",
            env_variant("imitation/TwoDMaze-v0", "two_d_maze"),
        )
        .variant(
            "custom_ant",
            "imitation/CustomAnt-v0",
            with(env_variant("imitation/CustomAnt-v0", "custom_ant"), ant_shared()),
        )
        .variant(
            "disabled_ant",
            "imitation/DisabledAnt-v0",
            with(env_variant("imitation/DisabledAnt-v0", "disabled_ant"), ant_shared()),
        )
        // Debug
        .variant(
            "fast",
            "Minimal computation, for smoke tests",
            map(json!({
                "n_epochs": 1,
                "n_expert_demos": 1,
                "n_episodes_eval": 1,
                "show_plots": false,
                "n_disc_steps_per_epoch": 1,
                "n_gen_steps_per_epoch": 1,
                "n_plot_episodes": 1,
                "init_trainer_kwargs": {
                    "parallel": false,
                    "max_episode_steps": 100,
                },
            })),
        )
}

fn str_of<'a>(config: &'a ConfigMap, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

/// Adds `log_dir`, `rollout_hint` and `rollout_path` unless already set.
///
/// * `log_dir` is `<log_root>/<env_name>/<unique timestamp>`, with `/` in `env_name`
///   replaced by `_`.
/// * `rollout_hint` is the part of `env_name` before the first `-`, lowercased.
/// * `rollout_path` is `data/expert_models/<rollout_hint>_0/rollouts/final.bincode`.
pub fn derive_paths(config: &mut ConfigMap) {
    let env_name = str_of(config, "env_name").unwrap_or_default().to_string();

    if str_of(config, "log_dir").is_none() {
        let log_root = str_of(config, "log_root").unwrap_or(".");
        let log_dir = PathBuf::from(log_root)
            .join(env_name.replace('/', "_"))
            .join(make_unique_timestamp());
        config.insert("log_dir".into(), json!(log_dir));
    }

    if str_of(config, "rollout_hint").is_none() {
        let hint = env_name.split('-').next().unwrap_or_default().to_lowercase();
        config.insert("rollout_hint".into(), json!(hint));
    }

    if str_of(config, "rollout_path").is_none() {
        let hint = str_of(config, "rollout_hint").unwrap_or_default();
        let rollout_path = PathBuf::from("data/expert_models")
            .join(format!("{}_0", hint))
            .join("rollouts")
            .join("final.bincode");
        config.insert("rollout_path".into(), json!(rollout_path));
    }
}

/// Builds the configuration of a run.
///
/// Variants are applied on the defaults, then `overrides` (e.g. from a YAML file),
/// then `updates` of the form `key=value`; finally paths are derived.
pub fn resolve<S: AsRef<str>, U: AsRef<str>>(
    variants: &[S],
    overrides: Option<&ConfigMap>,
    updates: &[U],
    mode: MergeMode,
) -> Result<ConfigMap> {
    let mut config = config_set().apply_variants(variants, mode)?;
    if let Some(overrides) = overrides {
        merge(&mut config, overrides, mode);
    }
    apply_updates(&mut config, updates)?;
    derive_paths(&mut config);
    Ok(config)
}

/// Typed view of a resolved configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TrainAdversarialConfig {
    /// Environment to train on.
    pub env_name: String,

    /// Training epochs.
    pub n_epochs: usize,

    /// Expert trajectories to use, all if `None`.
    pub n_expert_demos: Option<usize>,

    /// Episodes of the final evaluation.
    pub n_episodes_eval: usize,

    /// Discriminator steps per epoch.
    pub n_disc_steps_per_epoch: usize,

    /// Generator steps per epoch.
    pub n_gen_steps_per_epoch: usize,

    /// Entropy weight of the AIRL reward.
    pub airl_entropy_weight: f64,

    /// Epochs between plots; non-positive disables plots.
    pub plot_interval: i64,

    /// Episodes for each mean-return data point of plots.
    pub n_plot_episodes: usize,

    /// Show plots in addition to saving them.
    pub show_plots: bool,

    /// Passed to the trainer factory as they are.
    pub init_trainer_kwargs: ConfigMap,

    /// Root of log directories.
    pub log_root: PathBuf,

    /// Epochs between checkpoints; non-positive disables intermediate checkpoints.
    pub checkpoint_interval: i64,

    /// Write tensorboard logs of the generator.
    pub init_tensorboard: bool,

    /// Used to derive `rollout_path`.
    pub rollout_hint: Option<String>,

    /// Directory of models and logs of the run.
    pub log_dir: PathBuf,

    /// Expert trajectories.
    pub rollout_path: PathBuf,

    /// Random seed.
    #[serde(default)]
    pub seed: u64,
}

impl TrainAdversarialConfig {
    /// Reads the typed view of a resolved configuration.
    pub fn from_config_map(config: &ConfigMap) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(config.clone()))?)
    }

    /// Sets the number of epochs.
    pub fn n_epochs(mut self, v: usize) -> Self {
        self.n_epochs = v;
        self
    }

    /// Sets the interval of checkpoints in epochs.
    pub fn checkpoint_interval(mut self, v: i64) -> Self {
        self.checkpoint_interval = v;
        self
    }

    /// Sets the interval of plots in epochs.
    pub fn plot_interval(mut self, v: i64) -> Self {
        self.plot_interval = v;
        self
    }

    /// Sets the directory of the run.
    pub fn log_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.log_dir = v.into();
        self
    }

    /// Sets the path of the expert trajectories.
    pub fn rollout_path(mut self, v: impl Into<PathBuf>) -> Self {
        self.rollout_path = v.into();
        self
    }
}
