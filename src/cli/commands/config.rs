use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::output::{info, section_header_with_line, success};
use crate::core::config::{default_config, save_config, Config};
use crate::core::paths;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Destination (defaults to $GENOMECMP_HOME/config.toml)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            section_header_with_line("Configuration");
            print!("{}", toml::to_string_pretty(config)?);
            section_header_with_line("Paths");
            println!("{}", paths::describe_paths());
            Ok(())
        }
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(paths::default_config_path);
            if path.exists() && !force {
                info(&format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
                return Ok(());
            }
            save_config(&path, &default_config())?;
            success(&format!("Wrote {}", path.display()));
            Ok(())
        }
    }
}
