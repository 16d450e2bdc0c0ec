//! Shared fixtures for the integration tests
#![allow(dead_code)]

use genomecmp::bio::sequence::Proteome;
use genomecmp::jobs::status::{JobOutcome, JobResults, JobState, JobStatus};
use genomecmp::jobs::task::{AuthToken, Task};
use genomecmp::jobs::{QueueConfig, TaskRunner};
use genomecmp::storage::{JobStatusService, MemoryJobStatus, MemoryObjectStore};
use genomecmp::tools::{Aligner, HitStream, PairHit};
use genomecmp::{GenomeCmpError, Result};
use parking_lot::{Condvar, Mutex};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(20);

/// A coding feature: (id, contig, position, strand, length, translation)
pub type FeatureSpec<'a> = (&'a str, &'a str, i64, &'a str, i64, &'a str);

pub fn genome_json(id: &str, features: &[FeatureSpec]) -> Value {
    let features: Vec<Value> = features
        .iter()
        .map(|(fid, contig, pos, strand, len, seq)| {
            json!({
                "id": fid,
                "type": "CDS",
                "protein_translation": seq,
                "location": [[contig, pos, strand, len]]
            })
        })
        .collect();
    json!({ "id": id, "scientific_name": "Testus exemplaris", "features": features })
}

/// Two genomes with two proteins each, stored at ws/g1 and ws/g2
pub fn seeded_store() -> MemoryObjectStore {
    let store = MemoryObjectStore::new();
    store
        .put(
            "ws/g1",
            "Genome",
            genome_json(
                "g1",
                &[
                    ("p1b", "c1", 900, "+", 30, "MKLV"),
                    ("p1a", "c1", 100, "+", 30, "MKAV"),
                ],
            ),
        )
        .unwrap();
    store
        .put(
            "ws/g2",
            "Genome",
            genome_json(
                "g2",
                &[
                    ("p2a", "c9", 400, "-", 30, "MKAL"),
                    ("p2b", "c9", 800, "+", 30, "MKLL"),
                ],
            ),
        )
        .unwrap();
    store
}

/// Aligner that replays a fixed list of `(query, target, bit score)` hits
pub struct ScriptedAligner {
    hits: Vec<(String, String, f64)>,
    calls: AtomicUsize,
}

impl ScriptedAligner {
    pub fn new(hits: &[(&str, &str, f64)]) -> Self {
        Self {
            hits: hits
                .iter()
                .map(|(a, b, s)| (a.to_string(), b.to_string(), *s))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Aligner for ScriptedAligner {
    fn name(&self) -> &str {
        "scripted"
    }

    fn align(&self, _query: &Proteome, _target: &Proteome, _max_evalue: &str) -> Result<HitStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hits: Vec<Result<PairHit>> = self
            .hits
            .iter()
            .map(|(a, b, s)| Ok(PairHit::scored(a.clone(), b.clone(), *s)))
            .collect();
        Ok(Box::new(hits.into_iter()))
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

/// Aligner whose process always fails
pub struct FailingAligner;

impl Aligner for FailingAligner {
    fn name(&self) -> &str {
        "failing"
    }

    fn align(&self, _query: &Proteome, _target: &Proteome, _max_evalue: &str) -> Result<HitStream> {
        Err(GenomeCmpError::Alignment("blastp exited with status 2".to_string()))
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

/// Job-status service that records every transition in order
#[derive(Default)]
pub struct RecordingStatus {
    inner: MemoryJobStatus,
    events: Mutex<Vec<(String, JobState)>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, JobState)> {
        self.events.lock().clone()
    }

    /// Job ids in the order they were reported `running`
    pub fn started_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(_, state)| *state == JobState::Running)
            .map(|(id, _)| id)
            .collect()
    }
}

impl JobStatusService for RecordingStatus {
    fn create_job(&self, token: &AuthToken, description: BTreeMap<String, String>) -> Result<String> {
        let id = self.inner.create_job(token, description)?;
        self.events.lock().push((id.clone(), JobState::Queued));
        Ok(id)
    }

    fn update_job(&self, job_id: &str, token: &AuthToken, state: JobState) -> Result<()> {
        self.events.lock().push((job_id.to_string(), state));
        self.inner.update_job(job_id, token, state)
    }

    fn complete_job(&self, job_id: &str, token: &AuthToken, outcome: &JobOutcome) -> Result<()> {
        self.events.lock().push((job_id.to_string(), JobState::Done));
        self.inner.complete_job(job_id, token, outcome)
    }

    fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        self.inner.get_status(job_id)
    }
}

/// Job-status service that cannot allocate ids
pub struct UnavailableStatus;

impl JobStatusService for UnavailableStatus {
    fn create_job(&self, _token: &AuthToken, _description: BTreeMap<String, String>) -> Result<String> {
        Err(GenomeCmpError::JobStatus("service unavailable".to_string()))
    }

    fn update_job(&self, _job_id: &str, _token: &AuthToken, _state: JobState) -> Result<()> {
        Err(GenomeCmpError::JobStatus("service unavailable".to_string()))
    }

    fn complete_job(&self, _job_id: &str, _token: &AuthToken, _outcome: &JobOutcome) -> Result<()> {
        Err(GenomeCmpError::JobStatus("service unavailable".to_string()))
    }

    fn get_status(&self, _job_id: &str) -> Result<Option<JobStatus>> {
        Ok(None)
    }
}

/// Runner that blocks every task until the gate is opened
#[derive(Default)]
pub struct GatedRunner {
    open: Mutex<bool>,
    changed: Condvar,
    started: AtomicUsize,
}

impl GatedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.changed.notify_all();
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Spin until at least `n` tasks have entered the runner
    pub fn wait_started(&self, n: usize) {
        let deadline = std::time::Instant::now() + WAIT;
        while self.started() < n {
            assert!(std::time::Instant::now() < deadline, "tasks never started");
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl TaskRunner for GatedRunner {
    fn run(&self, task: &Task) -> Result<JobResults> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock();
        while !*open {
            self.changed.wait(&mut open);
        }
        Ok(JobResults {
            store_location: "memory".to_string(),
            output_refs: vec![task.params().output_ref.clone()],
        })
    }
}

/// Short idle waits so tests do not sit in the default 55-65 s sleep
pub fn fast_queue(workers: usize) -> QueueConfig {
    QueueConfig {
        workers,
        idle_wait_min: Duration::from_millis(20),
        idle_wait_max: Duration::from_millis(40),
    }
}
