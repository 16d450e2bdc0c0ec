pub mod pipeline;
pub mod queue;
pub mod status;
pub mod task;

pub use pipeline::{ComparisonPipeline, TaskRunner};
pub use queue::{run_task_once, JobQueue, QueueConfig};
pub use status::{JobOutcome, JobResults, JobState, JobStatus};
pub use task::{AuthToken, ComparisonParams, Task};
