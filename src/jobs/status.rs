/// Job lifecycle records as kept by the job-status service
///
/// The queue never stores its own copy of these; it reports transitions to the
/// service and reads them back from it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::GenomeCmpError;

/// Maximum length of the short error message attached to a failed job
pub const MAX_ERROR_MESSAGE_LEN: usize = 190;

const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Where a successful job left its output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResults {
    pub store_location: String,
    pub output_refs: Vec<String>,
}

/// Terminal outcome reported when a job reaches `done`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(JobResults),
    Failed { message: String, trace: String },
}

impl JobOutcome {
    /// Convert a task failure into the reported short message and full trace
    pub fn from_error(err: GenomeCmpError) -> Self {
        let message = summarize_error(&err);
        let kind = err.kind();
        let trace = format!("{}: {:?}", kind, anyhow::Error::new(err));
        JobOutcome::Failed { message, trace }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }
}

/// Snapshot of one job as recorded by the job-status service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub description: BTreeMap<String, String>,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<JobResults>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    pub fn queued(job_id: String, description: BTreeMap<String, String>) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            description,
            state: JobState::Queued,
            error: None,
            trace: None,
            results: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_state(&mut self, state: JobState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Succeeded(results) => {
                self.results = Some(results.clone());
                self.error = None;
                self.trace = None;
            }
            JobOutcome::Failed { message, trace } => {
                self.results = None;
                self.error = Some(message.clone());
                self.trace = Some(trace.clone());
            }
        }
        self.set_state(JobState::Done);
    }

    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }

    pub fn is_failed(&self) -> bool {
        self.is_done() && self.error.is_some()
    }

    /// Get a summary of the current state
    pub fn summary(&self) -> String {
        match (&self.state, &self.error) {
            (JobState::Done, Some(error)) => format!("{}: done with error: {}", self.job_id, error),
            (state, _) => format!(
                "{}: {} (updated {})",
                self.job_id,
                state,
                self.updated_at.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

/// Short message for a failed job: the error text, or its kind when empty, bounded in length
pub fn summarize_error(err: &GenomeCmpError) -> String {
    let message = if err.detail().trim().is_empty() {
        err.kind().to_string()
    } else {
        format!("Error: {}", err)
    };
    truncate_message(&message, MAX_ERROR_MESSAGE_LEN)
}

/// Bound a message to `max_len` characters, ending it with "..." when cut
pub fn truncate_message(message: &str, max_len: usize) -> String {
    if message.chars().count() <= max_len {
        return message.to_string();
    }
    let keep = max_len.saturating_sub(TRUNCATION_MARKER.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
