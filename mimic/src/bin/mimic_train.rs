use anyhow::Result;
use clap::{Parser, Subcommand};
use mimic::config::{load_config_map, train_adversarial, MergeMode};
use mimic_tracking::{dir_contains_run_jsons, find_result_dirs};
use std::path::PathBuf;

/// Configuration and results of adversarial imitation learning experiments.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved configuration of a run as YAML
    PrintConfig {
        /// Named variants, applied in order
        variants: Vec<String>,

        /// Update of the form key=value, applied after variants
        #[arg(long = "set", value_name = "KEY=VALUE")]
        updates: Vec<String>,

        /// YAML file of overrides, applied after variants
        #[arg(long)]
        config: Option<PathBuf>,

        /// Merge nested mappings key-wise instead of replacing them
        #[arg(long, default_value_t = false)]
        recursive_merge: bool,
    },

    /// List the named variants
    ListVariants,

    /// Print the run directories under a directory
    FindResults {
        /// Root of the search
        root: PathBuf,

        /// Allow run directories inside other run directories
        #[arg(long, default_value_t = false)]
        nested_ok: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::PrintConfig {
            variants,
            updates,
            config,
            recursive_merge,
        } => {
            let mode = if recursive_merge {
                MergeMode::Recursive
            } else {
                MergeMode::Shallow
            };
            let overrides = match config {
                Some(path) => Some(load_config_map(path)?),
                None => None,
            };
            let config = train_adversarial::resolve(&variants, overrides.as_ref(), &updates, mode)?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Command::ListVariants => {
            for (name, variant) in train_adversarial::config_set().variants() {
                println!("{:<14} {}", name, variant.doc);
            }
        }
        Command::FindResults { root, nested_ok } => {
            for dir in find_result_dirs(root, dir_contains_run_jsons, nested_ok)? {
                println!("{}", dir.display());
            }
        }
    }

    Ok(())
}
