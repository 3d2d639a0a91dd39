//! Training of adversarial imitation learning.
//!
//! The algorithm itself, GAIL or AIRL, is implemented by an [`AdversarialTrainer`].
//! [`train`] drives it through epochs, each consisting of discriminator steps
//! followed by generator steps, and takes care of checkpoints and logs:
//!
//! * Discriminators are saved to `<log_dir>/checkpoints/<step>/discrim/` and generator
//!   policies to `<log_dir>/checkpoints/<step>/gen_policy/`, where `<step>` is the
//!   zero-padded epoch or `final`. Generator policies can be loaded with
//!   [`load_policy`](mimic_core::load_policy).
//! * If `plot_interval > 0`, the discriminator loss after each phase and the mean
//!   return of the generator every `plot_interval` epochs are written as CSV files
//!   under `<log_dir>/plots/`.
use crate::{
    config::{set_nested, train_adversarial::TrainAdversarialConfig, ConfigMap},
    ConfigError,
};
use anyhow::Result;
use csv::WriterBuilder;
use log::{info, warn};
use mimic_core::{
    model::TrainedModel,
    rollout::{load_trajectories, rollout_stats, RolloutStats, Trajectory},
    save_policy, ObsNormalizer,
};
use mimic_tracking::{build_run_symlink, Run};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

/// Arguments of a trainer factory.
#[derive(Clone, Debug)]
pub struct TrainerInit {
    /// Environment to train on.
    pub env_name: String,

    /// Expert demonstrations.
    pub expert_trajs: Vec<Trajectory>,

    /// Random seed.
    pub seed: u64,

    /// Directory of the run.
    pub log_dir: PathBuf,

    /// `init_trainer_kwargs` of the configuration.
    pub kwargs: ConfigMap,
}

/// An adversarial imitation learning algorithm.
pub trait AdversarialTrainer {
    /// Model of the generator policy.
    type Model: TrainedModel;

    /// Takes `n_steps` optimization steps of the discriminator.
    fn train_disc(&mut self, n_steps: usize) -> Result<()>;

    /// Takes `n_steps` environment steps of generator training.
    fn train_gen(&mut self, n_steps: usize) -> Result<()>;

    /// Loss of the discriminator on fresh samples.
    fn eval_disc_loss(&mut self) -> Result<f32>;

    /// Saves the discriminator in `dir`.
    fn save_discrim(&self, dir: &Path) -> Result<()>;

    /// The generator.
    fn gen_model(&self) -> &Self::Model;

    /// Normalization statistics of the generator, if used.
    fn gen_normalizer(&self) -> Option<&ObsNormalizer>;

    /// Runs the generator for `n_episodes` episodes on the test environment.
    fn evaluate(&mut self, n_episodes: usize) -> Result<Vec<Trajectory>>;
}

/// Result of [`train`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TrainResults {
    /// Statistics of the final generator on the test environment.
    pub imit_stats: RolloutStats,

    /// Statistics of the expert demonstrations used for training.
    pub expert_stats: RolloutStats,
}

/// Saves the discriminator and the generator policy into `dir`.
pub fn save_checkpoint<T: AdversarialTrainer>(trainer: &T, dir: &Path) -> Result<()> {
    let discrim_dir = dir.join("discrim");
    fs::create_dir_all(&discrim_dir)?;
    trainer.save_discrim(&discrim_dir)?;
    save_policy(dir.join("gen_policy"), trainer.gen_model(), trainer.gen_normalizer())?;
    info!("Saved checkpoint in {:?}", dir);
    Ok(())
}

#[derive(Debug, Serialize)]
struct DiscLossRecord {
    plot_idx: usize,
    epoch: f32,
    phase: &'static str,
    disc_loss: f32,
}

#[derive(Debug, Serialize)]
struct EpReturnRecord {
    epoch: usize,
    gen_return_mean: f32,
    expert_return_mean: f32,
}

/// Collects data for plots.
struct TrainVisualizer {
    plot_dir: PathBuf,
    n_episodes: usize,
    expert_return_mean: f32,
    plot_idx: usize,
    disc_loss: Vec<DiscLossRecord>,
    ep_return: Vec<EpReturnRecord>,
}

impl TrainVisualizer {
    /// Also records the data before training.
    fn new<T: AdversarialTrainer>(
        trainer: &mut T,
        log_dir: &Path,
        n_episodes: usize,
        expert_return_mean: f32,
    ) -> Result<Self> {
        let mut visualizer = Self {
            plot_dir: log_dir.join("plots"),
            n_episodes,
            expert_return_mean,
            plot_idx: 0,
            disc_loss: vec![],
            ep_return: vec![],
        };
        visualizer.add_disc_loss(trainer, false)?;
        visualizer.add_ep_return(trainer, 0)?;
        Ok(visualizer)
    }

    fn add_disc_loss<T: AdversarialTrainer>(
        &mut self,
        trainer: &mut T,
        generator_active: bool,
    ) -> Result<()> {
        let phase = if generator_active { "gen" } else { "dis" };
        let disc_loss = trainer.eval_disc_loss()?;
        info!("plot idx ({}): {} disc loss: {}", phase, self.plot_idx, disc_loss);
        // Two data points per epoch.
        self.disc_loss.push(DiscLossRecord {
            plot_idx: self.plot_idx,
            epoch: self.plot_idx as f32 / 2.0,
            phase,
            disc_loss,
        });
        self.plot_idx += 1;
        Ok(())
    }

    fn add_ep_return<T: AdversarialTrainer>(
        &mut self,
        trainer: &mut T,
        epoch: usize,
    ) -> Result<()> {
        let stats = rollout_stats(&trainer.evaluate(self.n_episodes)?)?;
        info!("generator return: {}", stats.return_mean);
        self.ep_return.push(EpReturnRecord {
            epoch,
            gen_return_mean: stats.return_mean,
            expert_return_mean: self.expert_return_mean,
        });
        Ok(())
    }

    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.plot_dir)?;
        let file = File::create(self.plot_dir.join("disc_loss.csv"))?;
        let mut wtr = WriterBuilder::new().from_writer(file);
        for record in self.disc_loss.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        let file = File::create(self.plot_dir.join("ep_return.csv"))?;
        let mut wtr = WriterBuilder::new().from_writer(file);
        for record in self.ep_return.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        info!("Plot data saved to {:?}", self.plot_dir);
        Ok(())
    }
}

fn load_expert_trajs(config: &TrainAdversarialConfig) -> Result<Vec<Trajectory>> {
    let mut trajs = load_trajectories(&config.rollout_path)?;
    if let Some(n) = config.n_expert_demos {
        if trajs.len() < n {
            return Err(ConfigError::NotEnoughDemos {
                requested: n,
                available: trajs.len(),
            }
            .into());
        }
        trajs.truncate(n);
    }
    Ok(trajs)
}

fn is_multiple(epoch: usize, interval: i64) -> bool {
    interval > 0 && epoch as i64 % interval == 0
}

/// Trains a generator policy by adversarial imitation of expert demonstrations.
///
/// `make_trainer` builds the trainer from the expert demonstrations and
/// `init_trainer_kwargs`. `run` is only used to link `<log_dir>/sacred` to its run
/// directory.
pub fn train<T, F>(
    config: &TrainAdversarialConfig,
    run: &Run,
    make_trainer: F,
) -> Result<TrainResults>
where
    T: AdversarialTrainer,
    F: FnOnce(TrainerInit) -> Result<T>,
{
    info!("Logging to {:?}", config.log_dir);
    fs::create_dir_all(&config.log_dir)?;
    build_run_symlink(&config.log_dir, run)?;

    let expert_trajs = load_expert_trajs(config)?;
    let expert_stats = rollout_stats(&expert_trajs)?;

    let mut kwargs = config.init_trainer_kwargs.clone();
    if config.init_tensorboard {
        let tb_dir = config.log_dir.join("sb_tb");
        set_nested(&mut kwargs, "init_rl_kwargs.tensorboard_log", json!(tb_dir))?;
    }
    let mut trainer = make_trainer(TrainerInit {
        env_name: config.env_name.clone(),
        expert_trajs,
        seed: config.seed,
        log_dir: config.log_dir.clone(),
        kwargs,
    })?;

    let mut visualizer = if config.plot_interval > 0 {
        Some(TrainVisualizer::new(
            &mut trainer,
            &config.log_dir,
            config.n_plot_episodes,
            expert_stats.return_mean,
        )?)
    } else {
        None
    };

    let checkpoint_dir = config.log_dir.join("checkpoints");
    for epoch in 1..=config.n_epochs {
        info!("Epoch {}/{}", epoch, config.n_epochs);
        trainer.train_disc(config.n_disc_steps_per_epoch)?;
        if let Some(v) = visualizer.as_mut() {
            v.add_disc_loss(&mut trainer, false)?;
        }

        trainer.train_gen(config.n_gen_steps_per_epoch)?;
        if let Some(v) = visualizer.as_mut() {
            v.add_disc_loss(&mut trainer, true)?;
            if is_multiple(epoch, config.plot_interval) {
                v.add_ep_return(&mut trainer, epoch)?;
                v.save()?;
            }
        }

        if is_multiple(epoch, config.checkpoint_interval) {
            save_checkpoint(&trainer, &checkpoint_dir.join(format!("{:05}", epoch)))?;
        }
    }

    save_checkpoint(&trainer, &checkpoint_dir.join("final"))?;
    if let Some(v) = visualizer.as_ref() {
        v.save()?;
    }

    let trajs = trainer.evaluate(config.n_episodes_eval)?;
    Ok(TrainResults {
        imit_stats: rollout_stats(&trajs)?,
        expert_stats,
    })
}

/// Runs [`train`] as an observed run.
///
/// The observers of `run` record `config` when the run starts, then the results or the
/// error when it ends.
pub fn train_observed<T, F>(
    config: &ConfigMap,
    run: &mut Run,
    make_trainer: F,
) -> Result<TrainResults>
where
    T: AdversarialTrainer,
    F: FnOnce(TrainerInit) -> Result<T>,
{
    let typed = TrainAdversarialConfig::from_config_map(config)?;
    run.start(&serde_json::Value::Object(config.clone()))?;
    match train(&typed, run, make_trainer) {
        Ok(results) => {
            run.complete(&serde_json::to_value(&results)?)?;
            Ok(results)
        }
        Err(e) => {
            if let Err(record_err) = run.fail(&format!("{:?}", e)) {
                warn!("Failed to record the failure of the run: {}", record_err);
            }
            Err(e)
        }
    }
}
