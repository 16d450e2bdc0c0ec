pub mod bbh;
pub mod comparison;
pub mod config;
pub mod extractor;
pub mod paths;
pub mod publisher;

pub use bbh::{BbhData, BbhReducer, HitTuple};
pub use comparison::ComparisonResult;
pub use config::Config;
pub use extractor::FeatureExtractor;
pub use publisher::ResultPublisher;
