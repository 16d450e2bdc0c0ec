use anyhow::Context;
use clap::Args;
use std::time::Duration;

use super::LocalServices;
use crate::cli::output::{action, print_job_status, success};
use crate::core::config::Config;
use crate::jobs::queue::{JobQueue, QueueConfig};
use crate::jobs::task::{AuthToken, ComparisonParams};

// Effectively unbounded without overflowing Instant arithmetic
const NO_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

#[derive(Args)]
pub struct CompareArgs {
    /// First genome reference (workspace/name)
    #[arg(long, value_name = "REF")]
    pub genome1: String,

    /// Second genome reference (workspace/name)
    #[arg(long, value_name = "REF")]
    pub genome2: String,

    /// Where to store the comparison (workspace/name)
    #[arg(short, long, value_name = "REF")]
    pub output: String,

    /// BLAST E-value cutoff
    #[arg(long)]
    pub max_evalue: Option<String>,

    /// Keep hits scoring at least this percent of the best hit
    #[arg(long)]
    pub sub_bbh_percent: Option<f64>,

    /// Token forwarded to the stores
    #[arg(long, env = "GENOMECMP_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Give up waiting after this many seconds (0 = wait until done)
    #[arg(long, default_value = "0")]
    pub timeout: u64,

    /// Print the failure trace when the job fails
    #[arg(long)]
    pub trace: bool,
}

pub fn run(args: CompareArgs, config: &Config) -> anyhow::Result<()> {
    let services = LocalServices::from_config(config)?;

    let mut params = ComparisonParams::new(args.genome1, args.genome2, args.output);
    params.max_evalue = args.max_evalue;
    params.sub_bbh_percent = args.sub_bbh_percent;
    let params = params.or_defaults(&config.defaults.max_evalue, config.defaults.sub_bbh_percent);

    let queue = JobQueue::start(
        QueueConfig::from_config(config),
        services.pipeline,
        services.statuses,
    )?;

    let job_id = queue.submit(params, AuthToken::new(args.token))?;
    action(&format!("Submitted job {}", job_id));

    let timeout = match args.timeout {
        0 => NO_TIMEOUT,
        secs => Duration::from_secs(secs),
    };
    let status = queue
        .wait_for(&job_id, timeout)
        .with_context(|| format!("Waiting for job {}", job_id))?;
    queue.shutdown();

    print_job_status(&status, args.trace);
    if let Some(error) = &status.error {
        anyhow::bail!("Job {} failed: {}", job_id, error);
    }
    success(&format!(
        "Comparison stored in {}",
        services.store.root().display()
    ));
    Ok(())
}
