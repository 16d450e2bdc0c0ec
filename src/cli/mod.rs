pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::core::config::{load_config, Config};
use crate::core::paths;

#[derive(Parser)]
#[command(
    name = "genomecmp",
    version,
    about = "Reciprocal best-hit comparison of annotated genome proteomes",
    long_about = "genomecmp extracts the protein sets of two stored genomes, aligns them with BLAST, \
                  reduces the hits to bidirectional best hits and stores a compact, cross-indexed \
                  comparison result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to $GENOMECMP_HOME/config.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of worker threads (0 = configured value)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub workers: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two genomes and store the result
    Compare(commands::compare::CompareArgs),

    /// Run one already registered job without a worker pool
    RunTask(commands::run_task::RunTaskArgs),

    /// Show the recorded status of a job
    Status(commands::status::StatusArgs),

    /// Show or create the configuration file
    Config(commands::config::ConfigArgs),
}

/// Load the configuration from `path`, the default location, or built-in defaults
pub fn resolve_config(path: Option<&Path>, workers: usize) -> crate::Result<Config> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => {
            let default_path = paths::default_config_path();
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                Config::default()
            }
        }
    };
    if workers > 0 {
        config.workers.count = workers;
    }
    config.validate()?;
    Ok(config)
}
