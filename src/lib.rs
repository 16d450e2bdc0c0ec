pub mod bio;
pub mod cli;
pub mod core;
pub mod jobs;
pub mod storage;
pub mod tools;
pub mod utils;

pub use crate::core::{bbh::BbhReducer, comparison::ComparisonResult};
pub use crate::jobs::{queue::JobQueue, task::ComparisonParams};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenomeCmpError {
    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Data consistency error: {0}")]
    Consistency(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Job status error: {0}")]
    JobStatus(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenomeCmpError {
    /// Stable short name of the error category, used when a failure has no message
    pub fn kind(&self) -> &'static str {
        match self {
            GenomeCmpError::Submission(_) => "SubmissionError",
            GenomeCmpError::Extraction(_) => "ExtractionError",
            GenomeCmpError::Alignment(_) => "AlignmentError",
            GenomeCmpError::Consistency(_) => "ConsistencyError",
            GenomeCmpError::Publish(_) => "PublishError",
            GenomeCmpError::Storage(_) => "StorageError",
            GenomeCmpError::JobStatus(_) => "JobStatusError",
            GenomeCmpError::Config(_) => "ConfigError",
            GenomeCmpError::Panicked(_) => "TaskPanic",
            GenomeCmpError::Io(_) => "IoError",
            GenomeCmpError::Json(_) => "JsonError",
        }
    }

    /// The message carried by the error, without the category prefix
    pub fn detail(&self) -> String {
        match self {
            GenomeCmpError::Submission(m)
            | GenomeCmpError::Extraction(m)
            | GenomeCmpError::Alignment(m)
            | GenomeCmpError::Consistency(m)
            | GenomeCmpError::Publish(m)
            | GenomeCmpError::Storage(m)
            | GenomeCmpError::JobStatus(m)
            | GenomeCmpError::Config(m)
            | GenomeCmpError::Panicked(m) => m.clone(),
            GenomeCmpError::Io(e) => e.to_string(),
            GenomeCmpError::Json(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenomeCmpError>;
