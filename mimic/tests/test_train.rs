use anyhow::{anyhow, Result};
use mimic::{
    config::{
        train_adversarial::{resolve, TrainAdversarialConfig},
        ConfigMap, MergeMode,
    },
    train, train_observed, AdversarialTrainer, ConfigError, TrainerInit,
};
use mimic_core::{
    load_policy,
    model::{Ppo2Config, Ppo2Model},
    rollout::{save_trajectories, Trajectory},
    EnvSpec, Mat, MlpPolicyConfig, ObsNormalizer, Policy, Space,
};
use mimic_tracking::{FileStorageObserver, Observer, Run, RunDocs};
use serde_json::json;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempdir::TempDir;

fn env() -> EnvSpec {
    EnvSpec::new(Space::unbounded(3), Space::discrete(2))
}

fn traj(ret: f32) -> Trajectory {
    Trajectory {
        obs: Mat::zeros(3, 3),
        acts: Mat::zeros(2, 1),
        rews: vec![ret / 2.0; 2],
    }
}

struct MockTrainer {
    model: Ppo2Model,
    normalizer: ObsNormalizer,
    disc_steps: usize,
    gen_steps: usize,
}

impl MockTrainer {
    fn new() -> Self {
        let env = env();
        Self {
            model: Ppo2Model::new(&env, Ppo2Config::default(), &MlpPolicyConfig::default()),
            normalizer: ObsNormalizer::for_env(&env, true),
            disc_steps: 0,
            gen_steps: 0,
        }
    }
}

impl AdversarialTrainer for MockTrainer {
    type Model = Ppo2Model;

    fn train_disc(&mut self, n_steps: usize) -> Result<()> {
        self.disc_steps += n_steps;
        Ok(())
    }

    fn train_gen(&mut self, n_steps: usize) -> Result<()> {
        self.gen_steps += n_steps;
        self.model.num_timesteps += n_steps as u64;
        Ok(())
    }

    fn eval_disc_loss(&mut self) -> Result<f32> {
        Ok(1.0 / (1.0 + (self.disc_steps + self.gen_steps) as f32))
    }

    fn save_discrim(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join("disc_steps.txt"), self.disc_steps.to_string())?;
        Ok(())
    }

    fn gen_model(&self) -> &Ppo2Model {
        &self.model
    }

    fn gen_normalizer(&self) -> Option<&ObsNormalizer> {
        Some(&self.normalizer)
    }

    fn evaluate(&mut self, n_episodes: usize) -> Result<Vec<Trajectory>> {
        Ok((0..n_episodes).map(|_| traj(10.0)).collect())
    }
}

struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
    config: ConfigMap,
}

fn fixture(updates: &[&str]) -> Result<Fixture> {
    let tmp = TempDir::new("train_adversarial")?;
    let root = tmp.path().to_path_buf();
    let rollout_path = root.join("rollouts").join("final.bincode");
    save_trajectories(&rollout_path, &[traj(4.0), traj(6.0), traj(100.0)])?;

    let mut config = resolve(&["fast"], None, updates, MergeMode::Shallow)?;
    config.insert("log_dir".into(), json!(root.join("log")));
    config.insert("rollout_path".into(), json!(rollout_path));
    Ok(Fixture {
        _tmp: tmp,
        root,
        config,
    })
}

fn observed_run(root: &Path) -> Run {
    Run::new(vec![Observer::FileStorage(FileStorageObserver::new(root.join("sacred")))])
}

#[test]
fn test_train_writes_checkpoints() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let f = fixture(&[
        "n_epochs=4",
        "checkpoint_interval=2",
        "plot_interval=2",
        "n_expert_demos=2",
        "n_episodes_eval=3",
    ])?;
    let mut run = observed_run(&f.root);

    let results = train_observed(&f.config, &mut run, |init: TrainerInit| {
        assert_eq!(init.expert_trajs.len(), 2);
        let kwargs = f.config["init_trainer_kwargs"].as_object().cloned();
        assert_eq!(init.kwargs, kwargs.unwrap_or_default());
        Ok(MockTrainer::new())
    })?;
    assert_eq!(results.expert_stats.n_traj, 2);
    assert_eq!(results.expert_stats.return_mean, 5.0);
    assert_eq!(results.imit_stats.n_traj, 3);
    assert_eq!(results.imit_stats.return_mean, 10.0);

    let log_dir = f.root.join("log");
    let checkpoints = log_dir.join("checkpoints");
    let mut steps = vec![];
    for entry in fs::read_dir(&checkpoints)? {
        steps.push(entry?.file_name().to_string_lossy().into_owned());
    }
    steps.sort();
    assert_eq!(steps, vec!["00002", "00004", "final"]);

    for step in steps.iter() {
        let dir = checkpoints.join(step);
        assert!(dir.join("discrim").join("disc_steps.txt").is_file());
        let policy = load_policy("ppo2", dir.join("gen_policy"), &env())?;
        assert!(policy.normalization().is_some());
    }

    // One data point before training, then two per epoch.
    let mut rdr = csv::Reader::from_path(log_dir.join("plots").join("disc_loss.csv"))?;
    assert_eq!(rdr.records().count(), 9);
    let mut rdr = csv::Reader::from_path(log_dir.join("plots").join("ep_return.csv"))?;
    assert_eq!(rdr.records().count(), 3);

    let docs = RunDocs::load_from_dir(log_dir.join("sacred"))?;
    assert_eq!(docs.run["status"], "COMPLETED");
    assert_eq!(docs.run["result"]["imit_stats"]["n_traj"], 3);
    assert_eq!(docs.config["n_epochs"], 4);
    Ok(())
}

#[test]
fn test_only_final_checkpoint() -> Result<()> {
    let f = fixture(&[])?;
    let config = TrainAdversarialConfig::from_config_map(&f.config)?
        .n_epochs(3)
        .checkpoint_interval(0)
        .plot_interval(-1)
        .log_dir(f.root.join("log_final_only"))
        .rollout_path(f.root.join("rollouts").join("final.bincode"));

    // Without a file-storage observer, no link is made.
    let run = Run::new(vec![Observer::Other("stdout".to_string())]);
    train(&config, &run, |_| Ok(MockTrainer::new()))?;

    let checkpoints = config.log_dir.join("checkpoints");
    assert_eq!(fs::read_dir(&checkpoints)?.count(), 1);
    assert!(checkpoints.join("final").join("gen_policy").is_dir());
    assert!(!config.log_dir.join("plots").exists());
    assert!(fs::symlink_metadata(config.log_dir.join("sacred")).is_err());
    Ok(())
}

#[test]
fn test_not_enough_demos() -> Result<()> {
    let f = fixture(&["n_expert_demos=5"])?;
    let mut run = observed_run(&f.root);

    let err = train_observed(&f.config, &mut run, |_| Ok(MockTrainer::new())).unwrap_err();
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::NotEnoughDemos { requested, available }) => {
            assert_eq!((*requested, *available), (5, 3));
        }
        e => panic!("Unexpected error: {:?}", e),
    }

    let docs = RunDocs::load_from_dir(f.root.join("sacred").join("1"))?;
    assert_eq!(docs.run["status"], "FAILED");
    Ok(())
}

#[test]
fn test_training_error_is_kept() -> Result<()> {
    let f = fixture(&[])?;
    let mut run = observed_run(&f.root);
    let run_json = f.root.join("sacred").join("1").join("run.json");

    // The run record cannot be rewritten once training has started.
    let err = train_observed(&f.config, &mut run, |_: TrainerInit| -> Result<MockTrainer> {
        fs::remove_file(&run_json)?;
        fs::create_dir(&run_json)?;
        Err(anyhow!("simulator unavailable"))
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "simulator unavailable");
    Ok(())
}
