//! Worker sizing helpers

/// Upper bound for the default number of comparison workers.
///
/// Each worker drives an external aligner process, so the default stays small.
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// Default worker count: all cores, capped at `MAX_DEFAULT_WORKERS`
pub fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}
