/// Storage trait hierarchy for the comparison service
///
/// Both collaborators are remote and fallible from the core's point of view:
/// every call is a single attempt, nothing is cached locally.
use serde_json::Value;
use std::collections::BTreeMap;

use crate::jobs::status::{JobOutcome, JobState, JobStatus};
use crate::jobs::task::AuthToken;
use crate::Result;

/// Key-value object service holding genomes and comparison results
pub trait ObjectStore: Send + Sync {
    /// Fetch the data of a stored object
    fn get_object(&self, token: &AuthToken, reference: &str) -> Result<Value>;

    /// Store an object under `reference`, replacing any previous version
    fn save_object(
        &self,
        token: &AuthToken,
        reference: &str,
        type_name: &str,
        data: Value,
    ) -> Result<()>;

    /// Human-readable location of the store, reported with job results
    fn location(&self) -> String;
}

/// External job registry; owns job ids and the authoritative job state
pub trait JobStatusService: Send + Sync {
    /// Register a new job in state `queued` and return its id
    fn create_job(&self, token: &AuthToken, description: BTreeMap<String, String>)
        -> Result<String>;

    /// Record a non-terminal state change
    fn update_job(&self, job_id: &str, token: &AuthToken, state: JobState) -> Result<()>;

    /// Record the terminal outcome; the job moves to `done`
    fn complete_job(&self, job_id: &str, token: &AuthToken, outcome: &JobOutcome) -> Result<()>;

    /// Last recorded status, if the job is known
    fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>>;
}
