pub mod compare;
pub mod config;
pub mod run_task;
pub mod status;

use std::sync::Arc;

use crate::core::config::Config;
use crate::jobs::pipeline::ComparisonPipeline;
use crate::storage::{FsJobStatus, FsObjectStore};
use crate::tools::{Aligner, BlastAligner};

/// Filesystem stores and a BLAST-backed pipeline built from the configuration
pub(crate) struct LocalServices {
    pub store: Arc<FsObjectStore>,
    pub statuses: Arc<FsJobStatus>,
    pub pipeline: Arc<ComparisonPipeline>,
}

impl LocalServices {
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let store = Arc::new(FsObjectStore::new(&config.storage.object_store_path())?);
        let statuses = Arc::new(FsJobStatus::new(&config.storage.job_status_path())?);

        let aligner = BlastAligner::from_config(&config.aligner)?;
        aligner.verify_installation()?;

        let pipeline = Arc::new(ComparisonPipeline::new(store.clone(), Arc::new(aligner)));
        Ok(Self {
            store,
            statuses,
            pipeline,
        })
    }
}
