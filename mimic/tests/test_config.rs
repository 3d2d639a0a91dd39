use anyhow::Result;
use mimic::{
    config::{
        train_adversarial::{config_set, defaults},
        ConfigMap, MergeMode,
    },
    ConfigError,
};
use serde_json::{json, Value};

const ALL_VARIANTS: [&str; 18] = [
    "acrobot",
    "airl",
    "ant",
    "cartpole",
    "custom_ant",
    "disabled_ant",
    "fast",
    "gail",
    "half_cheetah",
    "hopper",
    "humanoid",
    "mountain_car",
    "pendulum",
    "plots",
    "reacher",
    "swimmer",
    "two_d_maze",
    "walker",
];

fn map(v: Value) -> ConfigMap {
    match v {
        Value::Object(m) => m,
        _ => panic!("not a mapping"),
    }
}

#[test]
fn test_defaults() {
    let d = defaults();
    assert_eq!(d["env_name"], json!("CartPole-v1"));
    assert_eq!(d["n_epochs"], json!(50));
    assert_eq!(d["n_expert_demos"], Value::Null);
    assert_eq!(d["n_episodes_eval"], json!(50));
    assert_eq!(d["n_disc_steps_per_epoch"], json!(50));
    assert_eq!(d["n_gen_steps_per_epoch"], json!(2048));
    assert_eq!(d["airl_entropy_weight"], json!(1.0));
    assert_eq!(d["plot_interval"], json!(-1));
    assert_eq!(d["n_plot_episodes"], json!(5));
    assert_eq!(d["show_plots"], json!(true));
    assert_eq!(d["log_root"], json!("output/train_adversarial"));
    assert_eq!(d["checkpoint_interval"], json!(5));
    assert_eq!(d["init_tensorboard"], json!(false));
    assert_eq!(d["rollout_hint"], Value::Null);

    let kwargs = &d["init_trainer_kwargs"];
    assert_eq!(kwargs["num_vec"], json!(8));
    assert_eq!(kwargs["parallel"], json!(true));
    assert_eq!(kwargs["max_episode_steps"], Value::Null);
    assert_eq!(kwargs["scale"], json!(true));
    assert_eq!(kwargs["reward_kwargs"]["theta_units"], json!([32, 32]));
    assert_eq!(kwargs["trainer_kwargs"]["gen_replay_buffer_capacity"], json!(1000));
    assert_eq!(kwargs["init_rl_kwargs"]["policy_class"], json!("FeedForward32Policy"));
}

#[test]
fn test_variant_names() {
    let set = config_set();
    let names: Vec<&str> = set.variants().map(|(name, _)| name).collect();
    assert_eq!(names, ALL_VARIANTS.to_vec());
}

#[test]
fn test_each_variant_overrides_only_its_keys() -> Result<()> {
    let set = config_set();
    let d = defaults();
    for name in ALL_VARIANTS.iter() {
        let config = set.apply_variants(&[name], MergeMode::Shallow)?;
        let patch = &set.get_variant(name)?.patch;
        for (k, v) in config.iter() {
            let expected = patch.get(k).unwrap_or_else(|| &d[k]);
            assert_eq!(v, expected, "{}: {}", name, k);
        }
        assert_eq!(config.len(), d.len(), "{}", name);
    }
    Ok(())
}

#[test]
fn test_nested_values_are_replaced() -> Result<()> {
    let config = config_set().apply_variants(&["cartpole"], MergeMode::Shallow)?;
    assert_eq!(config["init_trainer_kwargs"], json!({"scale": false}));

    let config = config_set().apply_variants(&["cartpole"], MergeMode::Recursive)?;
    let kwargs = &config["init_trainer_kwargs"];
    assert_eq!(kwargs["scale"], json!(false));
    assert_eq!(kwargs["num_vec"], json!(8));
    Ok(())
}

#[test]
fn test_ant_variants_share_settings() -> Result<()> {
    let set = config_set();
    let shared = map(json!({
        "n_epochs": 2000,
        "init_trainer_kwargs": {
            "init_rl_kwargs": {"n_steps": 2048},
            "max_episode_steps": 500,
        },
    }));
    for (name, env_name) in [
        ("ant", "Ant-v2"),
        ("custom_ant", "imitation/CustomAnt-v0"),
        ("disabled_ant", "imitation/DisabledAnt-v0"),
    ]
    .iter()
    {
        let config = set.apply_variants(&[name], MergeMode::Shallow)?;
        assert_eq!(config["env_name"], json!(env_name));
        for (k, v) in shared.iter() {
            assert_eq!(&config[k], v);
        }
    }
    Ok(())
}

#[test]
fn test_fast() -> Result<()> {
    let config = config_set().apply_variants(&["airl", "fast"], MergeMode::Shallow)?;
    for key in [
        "n_epochs",
        "n_expert_demos",
        "n_episodes_eval",
        "n_disc_steps_per_epoch",
        "n_gen_steps_per_epoch",
        "n_plot_episodes",
    ]
    .iter()
    {
        assert_eq!(config[*key], json!(1), "{}", key);
    }
    assert_eq!(config["show_plots"], json!(false));
    // `fast` comes last and replaces the mapping set by `airl`.
    assert_eq!(
        config["init_trainer_kwargs"],
        json!({"parallel": false, "max_episode_steps": 100})
    );
    Ok(())
}

#[test]
fn test_unknown_variant() {
    let err = config_set()
        .apply_variants(&["gail", "cheetah"], MergeMode::Shallow)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::UnknownVariant { name, .. }) if name == "cheetah"
    ));
}
