use clap::Args;

use crate::cli::output::{info, print_job_status};
use crate::core::config::Config;
use crate::storage::{FsJobStatus, JobStatusService};

#[derive(Args)]
pub struct StatusArgs {
    /// Job to show; all recorded jobs when omitted
    #[arg(long)]
    pub job_id: Option<String>,

    /// Include the failure trace
    #[arg(long)]
    pub trace: bool,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatusArgs, config: &Config) -> anyhow::Result<()> {
    let statuses = FsJobStatus::new(&config.storage.job_status_path())?;

    let jobs = match &args.job_id {
        Some(job_id) => match statuses.get_status(job_id)? {
            Some(status) => vec![status],
            None => anyhow::bail!("Unknown job: {}", job_id),
        },
        None => statuses.list()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        info("No jobs recorded");
        return Ok(());
    }
    for status in &jobs {
        print_job_status(status, args.trace);
    }
    Ok(())
}
