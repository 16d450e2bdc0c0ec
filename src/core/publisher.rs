use std::sync::Arc;
use tracing::info;

use crate::core::comparison::ComparisonResult;
use crate::jobs::task::AuthToken;
use crate::storage::ObjectStore;
use crate::{GenomeCmpError, Result};

/// Type name the comparison is stored under
pub const RESULT_TYPE: &str = "ProteomeComparison";

pub struct ResultPublisher {
    store: Arc<dyn ObjectStore>,
}

impl ResultPublisher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Validate and write the result once; nothing is written if validation fails
    pub fn publish(&self, output_ref: &str, token: &AuthToken, result: &ComparisonResult) -> Result<()> {
        result
            .validate()
            .map_err(|e| GenomeCmpError::Publish(format!("Refusing to publish: {}", e.detail())))?;

        let data = serde_json::to_value(result)
            .map_err(|e| GenomeCmpError::Publish(format!("Failed to encode result: {}", e)))?;
        self.store
            .save_object(token, output_ref, RESULT_TYPE, data)
            .map_err(|e| GenomeCmpError::Publish(format!("Failed to save {}: {}", output_ref, e)))?;

        let (hits1, hits2) = result.hit_counts();
        info!(output = output_ref, hits1, hits2, "Published comparison");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bbh::BbhData;
    use crate::storage::MemoryObjectStore;

    fn empty_result() -> ComparisonResult {
        ComparisonResult::from_bbh(
            BbhData {
                names1: vec!["a".into()],
                names2: vec!["b".into()],
                hits1: vec![vec![]],
                hits2: vec![vec![]],
            },
            90.0,
            "ws/g1",
            "ws/g2",
        )
    }

    #[test]
    fn test_publish_writes_typed_object() {
        let store = MemoryObjectStore::new();
        let publisher = ResultPublisher::new(Arc::new(store.clone()));

        publisher
            .publish("out/cmp", &AuthToken::anonymous(), &empty_result())
            .unwrap();

        let stored = store.get("out/cmp").unwrap();
        assert_eq!(stored.type_name, RESULT_TYPE);
        assert_eq!(stored.data["proteome2names"], serde_json::json!(["b"]));
    }

    #[test]
    fn test_invalid_result_not_written() {
        let store = MemoryObjectStore::new();
        let publisher = ResultPublisher::new(Arc::new(store.clone()));
        let mut result = empty_result();
        result.data1.clear();

        let err = publisher
            .publish("out/cmp", &AuthToken::anonymous(), &result)
            .unwrap_err();

        assert!(matches!(err, GenomeCmpError::Publish(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_bad_output_ref_is_publish_error() {
        let publisher = ResultPublisher::new(Arc::new(MemoryObjectStore::new()));
        let err = publisher
            .publish("no-slash", &AuthToken::anonymous(), &empty_result())
            .unwrap_err();
        assert!(matches!(err, GenomeCmpError::Publish(_)));
    }
}
