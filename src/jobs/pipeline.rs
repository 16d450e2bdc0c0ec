use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::bbh::BbhReducer;
use crate::core::comparison::ComparisonResult;
use crate::core::extractor::FeatureExtractor;
use crate::core::publisher::ResultPublisher;
use crate::jobs::status::JobResults;
use crate::jobs::task::Task;
use crate::storage::ObjectStore;
use crate::tools::Aligner;
use crate::Result;

/// Runs one task to completion; invoked by a single worker at a time
pub trait TaskRunner: Send + Sync {
    fn run(&self, task: &Task) -> Result<JobResults>;
}

/// extract → align → reduce → publish
pub struct ComparisonPipeline {
    extractor: FeatureExtractor,
    aligner: Arc<dyn Aligner>,
    publisher: ResultPublisher,
}

impl ComparisonPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, aligner: Arc<dyn Aligner>) -> Self {
        Self {
            extractor: FeatureExtractor::new(Arc::clone(&store)),
            aligner,
            publisher: ResultPublisher::new(store),
        }
    }
}

impl TaskRunner for ComparisonPipeline {
    fn run(&self, task: &Task) -> Result<JobResults> {
        let params = task.params();
        let token = task.token();

        let start = Instant::now();
        let proteome1 = self.extractor.extract(&params.genome1_ref, token)?;
        let proteome2 = self.extractor.extract(&params.genome2_ref, token)?;
        let extract_time = start.elapsed();

        let stage = Instant::now();
        let hits = self
            .aligner
            .align(&proteome1, &proteome2, params.max_evalue())?;
        let reducer = BbhReducer::new(params.sub_bbh_percent());
        let data = reducer.reduce(hits, &proteome1, &proteome2)?;
        let align_time = stage.elapsed();

        let stage = Instant::now();
        let result = ComparisonResult::from_bbh(
            data,
            reducer.sub_bbh_percent(),
            params.genome1_ref.clone(),
            params.genome2_ref.clone(),
        );
        self.publisher.publish(&params.output_ref, token, &result)?;
        let publish_time = stage.elapsed();

        info!(
            job_id = task.job_id(),
            aligner = self.aligner.name(),
            proteins1 = proteome1.len(),
            proteins2 = proteome2.len(),
            extract_ms = extract_time.as_millis() as u64,
            align_reduce_ms = align_time.as_millis() as u64,
            publish_ms = publish_time.as_millis() as u64,
            "Comparison finished in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        Ok(JobResults {
            store_location: self.publisher.location(),
            output_refs: vec![params.output_ref.clone()],
        })
    }
}
