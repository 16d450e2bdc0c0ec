/// Filesystem-backed collaborators used by the command-line front end
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::traits::{JobStatusService, ObjectStore};
use crate::jobs::status::{JobOutcome, JobState, JobStatus};
use crate::jobs::task::AuthToken;
use crate::utils::ObjectRef;
use crate::{GenomeCmpError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ObjectEnvelope {
    #[serde(rename = "type")]
    type_name: String,
    data: Value,
}

/// One JSON file per object at `<root>/<workspace>/<name>.json`
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, reference: &ObjectRef) -> PathBuf {
        self.root
            .join(&reference.workspace)
            .join(format!("{}.json", reference.name))
    }

    /// Stored type name of an object, if present
    pub fn type_of(&self, reference: &str) -> Result<Option<String>> {
        let path = self.object_path(&ObjectRef::parse(reference)?);
        if !path.exists() {
            return Ok(None);
        }
        let envelope: ObjectEnvelope = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Some(envelope.type_name))
    }
}

impl ObjectStore for FsObjectStore {
    fn get_object(&self, _token: &AuthToken, reference: &str) -> Result<Value> {
        let object_ref = ObjectRef::parse(reference)?;
        let path = self.object_path(&object_ref);
        if !path.exists() {
            return Err(GenomeCmpError::Storage(format!(
                "Object not found: {} (looked in {})",
                object_ref,
                path.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        let envelope: ObjectEnvelope = serde_json::from_str(&content).map_err(|e| {
            GenomeCmpError::Storage(format!("Corrupt object file {}: {}", path.display(), e))
        })?;
        Ok(envelope.data)
    }

    fn save_object(
        &self,
        _token: &AuthToken,
        reference: &str,
        type_name: &str,
        data: Value,
    ) -> Result<()> {
        let object_ref = ObjectRef::parse(reference)?;
        let path = self.object_path(&object_ref);
        let dir = self.root.join(&object_ref.workspace);
        fs::create_dir_all(&dir)?;

        let envelope = ObjectEnvelope {
            type_name: type_name.to_string(),
            data,
        };
        write_json_atomic(&dir, &path, &envelope)
            .map_err(|e| GenomeCmpError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(object = %object_ref, path = %path.display(), "Saved object");
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Stage `value` in a temp file inside `dir`, then rename it over `path`.
/// Readers see either the old file or the complete new one.
fn write_json_atomic<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<()> {
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut staged, value)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| GenomeCmpError::Io(e.error))?;
    Ok(())
}

/// Job registry persisted as one JSON file per job
pub struct FsJobStatus {
    state_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FsJobStatus {
    pub fn new(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn job_file(&self, job_id: &str) -> Result<PathBuf> {
        if job_id.is_empty() || job_id.contains(['/', '\\']) || job_id.starts_with('.') {
            return Err(GenomeCmpError::JobStatus(format!("Invalid job id: {:?}", job_id)));
        }
        Ok(self.state_dir.join(format!("{}.json", job_id)))
    }

    fn save(&self, status: &JobStatus) -> Result<()> {
        let path = self.job_file(&status.job_id)?;
        write_json_atomic(&self.state_dir, &path, status).map_err(|e| {
            GenomeCmpError::JobStatus(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    fn load(&self, job_id: &str) -> Result<Option<JobStatus>> {
        let path = self.job_file(job_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let status = serde_json::from_str(&content).map_err(|e| {
            GenomeCmpError::JobStatus(format!("Corrupt job file {}: {}", path.display(), e))
        })?;
        Ok(Some(status))
    }

    fn modify<F>(&self, job_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut JobStatus),
    {
        let _guard = self.write_lock.lock();
        let mut status = self
            .load(job_id)?
            .ok_or_else(|| GenomeCmpError::JobStatus(format!("Unknown job: {}", job_id)))?;
        f(&mut status);
        self.save(&status)
    }

    /// Register a job under an id chosen by the caller
    pub fn register(&self, job_id: &str, description: BTreeMap<String, String>) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.save(&JobStatus::queued(job_id.to_string(), description))
    }

    /// List all recorded jobs, oldest first
    pub fn list(&self) -> Result<Vec<JobStatus>> {
        let mut jobs = Vec::new();
        for entry in fs::read_dir(&self.state_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(job_id) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(status) = self.load(job_id)? {
                    jobs.push(status);
                }
            }
        }
        jobs.sort_by_key(|s| s.created_at);
        Ok(jobs)
    }
}

impl JobStatusService for FsJobStatus {
    fn create_job(
        &self,
        _token: &AuthToken,
        description: BTreeMap<String, String>,
    ) -> Result<String> {
        let job_id = Uuid::new_v4().to_string();
        self.register(&job_id, description)?;
        Ok(job_id)
    }

    fn update_job(&self, job_id: &str, _token: &AuthToken, state: JobState) -> Result<()> {
        self.modify(job_id, |status| status.set_state(state))
    }

    fn complete_job(&self, job_id: &str, _token: &AuthToken, outcome: &JobOutcome) -> Result<()> {
        self.modify(job_id, |status| status.complete(outcome))
    }

    fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        self.load(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_fs_object_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        let token = AuthToken::anonymous();

        store
            .save_object(&token, "results/cmp", "ProteomeComparison", json!({"a": 1}))
            .unwrap();

        assert!(dir.path().join("results").join("cmp.json").exists());
        assert_eq!(store.get_object(&token, "results/cmp").unwrap(), json!({"a": 1}));
        assert_eq!(
            store.type_of("results/cmp").unwrap().as_deref(),
            Some("ProteomeComparison")
        );
    }

    #[test]
    fn test_fs_object_missing() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        assert!(store.get_object(&AuthToken::anonymous(), "ws/none").is_err());
        assert_eq!(store.type_of("ws/none").unwrap(), None);
    }

    #[test]
    fn test_fs_job_status_persists() {
        let dir = TempDir::new().unwrap();
        let token = AuthToken::anonymous();
        let job_id = {
            let service = FsJobStatus::new(dir.path()).unwrap();
            let id = service.create_job(&token, BTreeMap::new()).unwrap();
            service.update_job(&id, &token, JobState::Running).unwrap();
            id
        };

        let reopened = FsJobStatus::new(dir.path()).unwrap();
        let status = reopened.get_status(&job_id).unwrap().unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(reopened.list().unwrap().len(), 1);
    }

    #[test]
    fn test_fs_job_reads_never_see_partial_writes() {
        let dir = TempDir::new().unwrap();
        let service = std::sync::Arc::new(FsJobStatus::new(dir.path()).unwrap());
        let token = AuthToken::anonymous();
        let description: BTreeMap<String, String> = (0..200)
            .map(|i| (format!("key_{}", i), "x".repeat(64)))
            .collect();
        let id = service.create_job(&token, description).unwrap();

        let writer = {
            let service = service.clone();
            let id = id.clone();
            std::thread::spawn(move || {
                let token = AuthToken::anonymous();
                for i in 0..200 {
                    let state = if i % 2 == 0 { JobState::Running } else { JobState::Queued };
                    service.update_job(&id, &token, state).unwrap();
                }
            })
        };
        while !writer.is_finished() {
            assert!(service.get_status(&id).unwrap().is_some());
        }
        writer.join().unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_fs_job_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let service = FsJobStatus::new(dir.path()).unwrap();
        assert!(service.get_status("../escape").is_err());
    }
}
