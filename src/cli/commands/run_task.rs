use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::LocalServices;
use crate::cli::output::{info, print_job_status};
use crate::core::config::Config;
use crate::jobs::queue::run_task_once;
use crate::jobs::status::JobOutcome;
use crate::jobs::task::{AuthToken, ComparisonParams, Task};
use crate::storage::JobStatusService;

#[derive(Args)]
pub struct RunTaskArgs {
    /// Id of the job to run
    #[arg(long)]
    pub job_id: String,

    /// Comparison parameters as JSON
    #[arg(long, conflicts_with = "params_file", required_unless_present = "params_file")]
    pub params: Option<String>,

    /// Read the comparison parameters from a JSON file
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Token forwarded to the stores
    #[arg(long, env = "GENOMECMP_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,
}

pub fn run(args: RunTaskArgs, config: &Config) -> anyhow::Result<()> {
    let json = match (&args.params, &args.params_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("--params or --params-file is required"),
    };
    let params: ComparisonParams =
        serde_json::from_str(&json).context("Failed to parse comparison parameters")?;
    let params = params.or_defaults(&config.defaults.max_evalue, config.defaults.sub_bbh_percent);
    params.validate()?;

    let services = LocalServices::from_config(config)?;
    if services.statuses.get_status(&args.job_id)?.is_none() {
        info(&format!("Registering job {}", args.job_id));
        services.statuses.register(&args.job_id, params.job_data())?;
    }

    let task = Task::new(args.job_id.clone(), params, AuthToken::new(args.token));
    let outcome = run_task_once(&task, services.pipeline.as_ref(), services.statuses.as_ref());

    if let Some(status) = services.statuses.get_status(&args.job_id)? {
        print_job_status(&status, !outcome.is_success());
    }
    match outcome {
        JobOutcome::Succeeded(_) => Ok(()),
        JobOutcome::Failed { message, .. } => anyhow::bail!("Job {} failed: {}", args.job_id, message),
    }
}
