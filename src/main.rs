use clap::Parser;
use genomecmp::cli::output::error;
use genomecmp::cli::{resolve_config, Cli, Commands};
use genomecmp::GenomeCmpError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize logging with GENOMECMP_LOG environment variable support
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("GENOMECMP_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error(&format!("{:#}", e));

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<GenomeCmpError>() {
            Some(GenomeCmpError::Config(_)) => 2,
            Some(GenomeCmpError::Io(_)) => 3,
            Some(GenomeCmpError::Extraction(_))
            | Some(GenomeCmpError::Consistency(_))
            | Some(GenomeCmpError::Alignment(_)) => 4,
            Some(GenomeCmpError::Storage(_))
            | Some(GenomeCmpError::Publish(_))
            | Some(GenomeCmpError::JobStatus(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.workers)?;

    if cli.verbose > 0 {
        eprintln!("Using {} workers", config.workers.count);
    }

    match cli.command {
        Commands::Compare(args) => genomecmp::cli::commands::compare::run(args, &config),
        Commands::RunTask(args) => genomecmp::cli::commands::run_task::run(args, &config),
        Commands::Status(args) => genomecmp::cli::commands::status::run(args, &config),
        Commands::Config(args) => genomecmp::cli::commands::config::run(args, &config),
    }
}
