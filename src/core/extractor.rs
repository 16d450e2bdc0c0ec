/// Protein extraction from stored genomes
///
/// Only coding features are kept. Each one is placed by its first location
/// segment and the set is sorted by `(contig, start, stop)`, so the resulting
/// proteome order is reproducible for identical genome data.
use std::sync::Arc;
use tracing::{debug, info};

use crate::bio::genome::{Feature, Genome};
use crate::bio::sequence::{ProteinRecord, Proteome};
use crate::jobs::task::AuthToken;
use crate::storage::ObjectStore;
use crate::{GenomeCmpError, Result};

pub struct FeatureExtractor {
    store: Arc<dyn ObjectStore>,
}

impl FeatureExtractor {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Load a genome and return its ordered protein set
    pub fn extract(&self, genome_ref: &str, token: &AuthToken) -> Result<Proteome> {
        let data = self.store.get_object(token, genome_ref)?;
        let genome: Genome = serde_json::from_value(data).map_err(|e| {
            GenomeCmpError::Extraction(format!("Malformed genome {}: {}", genome_ref, e))
        })?;

        let records = extract_records(&genome)?;
        info!(
            genome = genome_ref,
            kept = records.len(),
            total = genome.features.len(),
            "Extracted coding features"
        );
        Ok(Proteome::from_records(records))
    }
}

/// Coding features of a genome as protein records in `(contig, start, stop)` order
pub fn extract_records(genome: &Genome) -> Result<Vec<ProteinRecord>> {
    let mut records = genome
        .features
        .iter()
        .filter(|feature| feature.is_coding())
        .map(|feature| to_record(&genome.id, feature))
        .collect::<Result<Vec<_>>>()?;

    records.sort_by(|a, b| {
        a.contig
            .cmp(&b.contig)
            .then(a.start.cmp(&b.start))
            .then(a.stop.cmp(&b.stop))
    });
    Ok(records)
}

fn to_record(genome_id: &str, feature: &Feature) -> Result<ProteinRecord> {
    let sequence = feature
        .protein_translation
        .as_deref()
        .filter(|seq| !seq.is_empty())
        .ok_or_else(|| {
            GenomeCmpError::Extraction(format!(
                "Feature {} of genome {} has no protein translation",
                feature.id, genome_id
            ))
        })?;

    let location = feature.location.first().ok_or_else(|| {
        GenomeCmpError::Extraction(format!(
            "Feature {} of genome {} has no location",
            feature.id, genome_id
        ))
    })?;
    if feature.location.len() > 1 {
        debug!(
            feature = %feature.id,
            segments = feature.location.len(),
            "Using first location segment only"
        );
    }

    let (start, stop) = location.span().map_err(|e| {
        GenomeCmpError::Extraction(format!("Feature {} of genome {}: {}", feature.id, genome_id, e))
    })?;
    if start < 0 || location.length() < 0 {
        return Err(GenomeCmpError::Extraction(format!(
            "Feature {} of genome {} has an invalid location ({}..{})",
            feature.id, genome_id, start, stop
        )));
    }

    Ok(ProteinRecord::new(
        feature.id.clone(),
        sequence.to_string(),
        location.contig().to_string(),
        start,
        stop,
    ))
}
