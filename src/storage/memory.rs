use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::traits::{JobStatusService, ObjectStore};
use crate::jobs::status::{JobOutcome, JobState, JobStatus};
use crate::jobs::task::AuthToken;
use crate::utils::ObjectRef;
use crate::{GenomeCmpError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub type_name: String,
    pub data: Value,
}

/// In-process object store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through a token
    pub fn put(&self, reference: &str, type_name: &str, data: Value) -> Result<()> {
        let key = ObjectRef::parse(reference)?.to_string();
        self.objects.insert(
            key,
            StoredObject {
                type_name: type_name.to_string(),
                data,
            },
        );
        Ok(())
    }

    pub fn get(&self, reference: &str) -> Option<StoredObject> {
        self.objects.get(reference).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.objects.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, _token: &AuthToken, reference: &str) -> Result<Value> {
        let key = ObjectRef::parse(reference)?.to_string();
        self.objects
            .get(&key)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| GenomeCmpError::Storage(format!("Object not found: {}", key)))
    }

    fn save_object(
        &self,
        _token: &AuthToken,
        reference: &str,
        type_name: &str,
        data: Value,
    ) -> Result<()> {
        self.put(reference, type_name, data)
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// In-process job registry
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStatus {
    jobs: Arc<DashMap<String, JobStatus>>,
}

impl MemoryJobStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn with_job<F>(&self, job_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut JobStatus),
    {
        let mut entry = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| GenomeCmpError::JobStatus(format!("Unknown job: {}", job_id)))?;
        f(entry.value_mut());
        Ok(())
    }
}

impl JobStatusService for MemoryJobStatus {
    fn create_job(
        &self,
        _token: &AuthToken,
        description: BTreeMap<String, String>,
    ) -> Result<String> {
        let job_id = Uuid::new_v4().to_string();
        self.jobs
            .insert(job_id.clone(), JobStatus::queued(job_id.clone(), description));
        Ok(job_id)
    }

    fn update_job(&self, job_id: &str, _token: &AuthToken, state: JobState) -> Result<()> {
        self.with_job(job_id, |status| status.set_state(state))
    }

    fn complete_job(&self, job_id: &str, _token: &AuthToken, outcome: &JobOutcome) -> Result<()> {
        self.with_job(job_id, |status| status.complete(outcome))
    }

    fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        Ok(self.jobs.get(job_id).map(|entry| entry.value().clone()))
    }
}
