/// Job queue and worker pool
///
/// A fixed set of named worker threads share one FIFO queue and one index of
/// live tasks, both behind a single mutex. Idle workers sleep on a condition
/// variable with a randomized timeout so they do not all wake at once.
/// Shutdown is cooperative: running tasks always finish.
use parking_lot::{Condvar, Mutex};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::config::Config;
use crate::jobs::pipeline::TaskRunner;
use crate::jobs::status::{JobOutcome, JobState, JobStatus};
use crate::jobs::task::{AuthToken, ComparisonParams, Task};
use crate::storage::JobStatusService;
use crate::{GenomeCmpError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub workers: usize,
    pub idle_wait_min: Duration,
    pub idle_wait_max: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl QueueConfig {
    pub fn from_config(config: &Config) -> Self {
        let (idle_wait_min, idle_wait_max) = config.workers.idle_wait_bounds();
        Self {
            workers: config.workers.count,
            idle_wait_min,
            idle_wait_max,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Uniformly distributed idle wait within the configured bounds
    pub fn random_idle_wait(&self) -> Duration {
        let min = self.idle_wait_min.as_millis() as u64;
        let max = (self.idle_wait_max.as_millis() as u64).max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

struct QueueState {
    queue: VecDeque<Arc<Task>>,
    live: HashMap<String, Arc<Task>>,
}

struct Shared {
    state: Mutex<QueueState>,
    /// Signalled on enqueue and shutdown
    wakeup: Condvar,
    /// Signalled whenever a task leaves the live index
    finished: Condvar,
    stopping: AtomicBool,
    runner: Arc<dyn TaskRunner>,
    statuses: Arc<dyn JobStatusService>,
    config: QueueConfig,
}

pub struct JobQueue {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobQueue {
    /// Start the worker pool
    pub fn start(
        config: QueueConfig,
        runner: Arc<dyn TaskRunner>,
        statuses: Arc<dyn JobStatusService>,
    ) -> Result<Self> {
        if config.workers == 0 {
            return Err(GenomeCmpError::Config(
                "Job queue needs at least one worker".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                live: HashMap::new(),
            }),
            wakeup: Condvar::new(),
            finished: Condvar::new(),
            stopping: AtomicBool::new(false),
            runner,
            statuses,
            config,
        });

        let queue = Self {
            shared: Arc::clone(&shared),
            handles: Mutex::new(Vec::with_capacity(shared.config.workers)),
        };
        for index in 0..shared.config.workers {
            let worker_shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("genomecmp-worker-{}", index))
                .spawn(move || worker_loop(worker_shared, index))?;
            queue.handles.lock().push(handle);
        }

        info!(workers = shared.config.workers, "Job queue started");
        Ok(queue)
    }

    /// Register a job with the status service and enqueue it.
    ///
    /// Nothing is enqueued unless the service confirmed a job id.
    pub fn submit(&self, params: ComparisonParams, token: AuthToken) -> Result<String> {
        if self.is_stopping() {
            return Err(GenomeCmpError::Submission(
                "Job queue is shutting down".to_string(),
            ));
        }
        params.validate()?;

        let job_id = self
            .shared
            .statuses
            .create_job(&token, params.job_data())
            .map_err(|e| GenomeCmpError::Submission(format!("Could not register job: {}", e)))?;

        let task = Arc::new(Task::new(job_id.clone(), params, token));
        let queued = {
            let mut state = self.shared.state.lock();
            state.queue.push_back(Arc::clone(&task));
            state.live.insert(job_id.clone(), task);
            state.queue.len()
        };
        self.shared.wakeup.notify_one();

        info!(job_id = %job_id, queued, "Job submitted");
        Ok(job_id)
    }

    /// Status as last recorded by the job-status service
    pub fn status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        self.shared.statuses.get_status(job_id)
    }

    /// Block until `job_id` has left the live index, then return its recorded status
    pub fn wait_for(&self, job_id: &str, timeout: Duration) -> Result<JobStatus> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.shared.state.lock();
            while state.live.contains_key(job_id) {
                if self
                    .shared
                    .finished
                    .wait_until(&mut state, deadline)
                    .timed_out()
                    && state.live.contains_key(job_id)
                {
                    return Err(GenomeCmpError::JobStatus(format!(
                        "Timed out waiting for job {}",
                        job_id
                    )));
                }
            }
        }

        self.status(job_id)?
            .ok_or_else(|| GenomeCmpError::JobStatus(format!("Unknown job: {}", job_id)))
    }

    pub fn live_job_ids(&self) -> Vec<String> {
        let state = self.shared.state.lock();
        let mut ids: Vec<String> = state.live.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_live(&self, job_id: &str) -> bool {
        self.shared.state.lock().live.contains_key(job_id)
    }

    pub fn queued_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn worker_count(&self) -> usize {
        self.shared.config.workers
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::SeqCst)
    }

    /// Stop picking up tasks, wake idle workers and wait for running tasks.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        let first = {
            // Set under the lock so a worker cannot miss the flag between check and wait
            let _state = self.shared.state.lock();
            !self.shared.stopping.swap(true, Ordering::SeqCst)
        };
        if first {
            info!("Job queue shutdown requested");
        }
        self.shared.wakeup.notify_all();

        let mut handles = self.handles.lock();
        for handle in handles.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker thread panicked");
            }
        }

        if first {
            let abandoned = self.queued_len();
            if abandoned > 0 {
                warn!(abandoned, "Shut down with jobs still queued");
            }
            info!("Job queue stopped");
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>, index: usize) {
    debug!(worker = index, "Worker started");
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if shared.stopping.load(Ordering::SeqCst) {
                    break None;
                }
                if let Some(task) = state.queue.pop_front() {
                    break Some(task);
                }
                let wait = shared.config.random_idle_wait();
                shared.wakeup.wait_for(&mut state, wait);
            }
        };

        let Some(task) = task else {
            break;
        };

        debug!(worker = index, job_id = task.job_id(), "Picked up job");
        run_task_once(&task, shared.runner.as_ref(), shared.statuses.as_ref());

        shared.state.lock().live.remove(task.job_id());
        shared.finished.notify_all();
    }
    debug!(worker = index, "Worker stopped");
}

/// Run one task with `running`/`done` reporting and return its outcome.
///
/// Every failure, including a panic in the runner or the status service,
/// ends as a failed outcome and never unwinds into the worker.
pub fn run_task_once(
    task: &Task,
    runner: &dyn TaskRunner,
    statuses: &dyn JobStatusService,
) -> JobOutcome {
    let start = Instant::now();
    let result = guarded(|| statuses.update_job(task.job_id(), task.token(), JobState::Running))
        .and_then(|_| guarded(|| runner.run(task)));

    let outcome = match result {
        Ok(results) => {
            info!(
                job_id = task.job_id(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Job finished"
            );
            JobOutcome::Succeeded(results)
        }
        Err(e) => {
            let outcome = JobOutcome::from_error(e);
            if let JobOutcome::Failed { message, .. } = &outcome {
                warn!(job_id = task.job_id(), error = %message, "Job failed");
            }
            outcome
        }
    };

    if let Err(e) = guarded(|| statuses.complete_job(task.job_id(), task.token(), &outcome)) {
        error!(job_id = task.job_id(), error = %e, "Could not report job completion");
    }
    outcome
}

/// Run `f`, turning a panic into `GenomeCmpError::Panicked`
fn guarded<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(GenomeCmpError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::status::JobResults;
    use crate::storage::MemoryJobStatus;

    struct Succeeds;

    impl TaskRunner for Succeeds {
        fn run(&self, task: &Task) -> Result<JobResults> {
            Ok(JobResults {
                store_location: "memory".to_string(),
                output_refs: vec![task.params().output_ref.clone()],
            })
        }
    }

    struct Panics;

    impl TaskRunner for Panics {
        fn run(&self, _task: &Task) -> Result<JobResults> {
            panic!("reducer exploded")
        }
    }

    /// Records everything but panics when asked to complete a job
    struct PanicsOnComplete(MemoryJobStatus);

    impl JobStatusService for PanicsOnComplete {
        fn create_job(
            &self,
            token: &AuthToken,
            description: std::collections::BTreeMap<String, String>,
        ) -> Result<String> {
            self.0.create_job(token, description)
        }

        fn update_job(&self, job_id: &str, token: &AuthToken, state: JobState) -> Result<()> {
            self.0.update_job(job_id, token, state)
        }

        fn complete_job(&self, _job_id: &str, _token: &AuthToken, _outcome: &JobOutcome) -> Result<()> {
            panic!("status service went away")
        }

        fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>> {
            self.0.get_status(job_id)
        }
    }

    fn fast_config(workers: usize) -> QueueConfig {
        QueueConfig {
            workers,
            idle_wait_min: Duration::from_millis(50),
            idle_wait_max: Duration::from_millis(80),
        }
    }

    fn params() -> ComparisonParams {
        ComparisonParams::new("ws/g1", "ws/g2", "ws/out")
    }

    #[test]
    fn test_idle_wait_within_bounds() {
        let config = QueueConfig::default();
        for _ in 0..100 {
            let wait = config.random_idle_wait();
            assert!(wait >= Duration::from_secs(55));
            assert!(wait <= Duration::from_secs(65));
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = JobQueue::start(
            fast_config(0),
            Arc::new(Succeeds),
            Arc::new(MemoryJobStatus::new()),
        );
        assert!(matches!(result, Err(GenomeCmpError::Config(_))));
    }

    #[test]
    fn test_job_runs_to_done() {
        let statuses = Arc::new(MemoryJobStatus::new());
        let queue = JobQueue::start(fast_config(2), Arc::new(Succeeds), statuses.clone()).unwrap();

        let id = queue.submit(params(), AuthToken::anonymous()).unwrap();
        let status = queue.wait_for(&id, Duration::from_secs(10)).unwrap();

        assert!(status.is_done());
        assert_eq!(status.results.unwrap().output_refs, vec!["ws/out"]);
        assert!(!queue.is_live(&id));
        queue.shutdown();
    }

    #[test]
    fn test_panic_becomes_failed_job() {
        let statuses = Arc::new(MemoryJobStatus::new());
        let queue = JobQueue::start(fast_config(1), Arc::new(Panics), statuses).unwrap();

        let id = queue.submit(params(), AuthToken::anonymous()).unwrap();
        let status = queue.wait_for(&id, Duration::from_secs(10)).unwrap();

        assert!(status.is_failed());
        assert!(status.error.unwrap().contains("reducer exploded"));
    }

    #[test]
    fn test_status_service_panic_does_not_kill_worker() {
        let queue = JobQueue::start(
            fast_config(1),
            Arc::new(Succeeds),
            Arc::new(PanicsOnComplete(MemoryJobStatus::new())),
        )
        .unwrap();

        for _ in 0..2 {
            let id = queue.submit(params(), AuthToken::anonymous()).unwrap();
            let status = queue.wait_for(&id, Duration::from_secs(10)).unwrap();

            assert_eq!(status.state, JobState::Running);
            assert!(!queue.is_live(&id));
        }
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let queue = JobQueue::start(
            fast_config(1),
            Arc::new(Succeeds),
            Arc::new(MemoryJobStatus::new()),
        )
        .unwrap();
        queue.shutdown();
        queue.shutdown();

        assert!(matches!(
            queue.submit(params(), AuthToken::anonymous()),
            Err(GenomeCmpError::Submission(_))
        ));
    }
}
