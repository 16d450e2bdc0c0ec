use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::bbh::{BbhData, HitTuple};
use crate::{GenomeCmpError, Result};

/// Persisted proteome comparison
///
/// `data1[i]` holds the reduced hits of `proteome1_names[i]`, each pointing at a
/// position in `proteome2_names`; `data2` mirrors it for the second genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub sub_bbh_percent: f64,
    #[serde(rename = "genome1ref")]
    pub genome1_ref: String,
    #[serde(rename = "genome2ref")]
    pub genome2_ref: String,
    #[serde(rename = "proteome1names")]
    pub proteome1_names: Vec<String>,
    #[serde(rename = "proteome1map")]
    pub proteome1_map: BTreeMap<String, usize>,
    #[serde(rename = "proteome2names")]
    pub proteome2_names: Vec<String>,
    #[serde(rename = "proteome2map")]
    pub proteome2_map: BTreeMap<String, usize>,
    pub data1: Vec<Vec<HitTuple>>,
    pub data2: Vec<Vec<HitTuple>>,
}

impl ComparisonResult {
    pub fn from_bbh(
        data: BbhData,
        sub_bbh_percent: f64,
        genome1_ref: impl Into<String>,
        genome2_ref: impl Into<String>,
    ) -> Self {
        let proteome1_map = position_map(&data.names1);
        let proteome2_map = position_map(&data.names2);
        Self {
            sub_bbh_percent,
            genome1_ref: genome1_ref.into(),
            genome2_ref: genome2_ref.into(),
            proteome1_names: data.names1,
            proteome1_map,
            proteome2_names: data.names2,
            proteome2_map,
            data1: data.hits1,
            data2: data.hits2,
        }
    }

    /// Number of retained hits in each direction
    pub fn hit_counts(&self) -> (usize, usize) {
        (
            self.data1.iter().map(Vec::len).sum(),
            self.data2.iter().map(Vec::len).sum(),
        )
    }

    /// Check that hit lists align with the name arrays and every partner index resolves
    pub fn validate(&self) -> Result<()> {
        check_side(
            "data1",
            &self.proteome1_names,
            &self.proteome1_map,
            &self.data1,
            self.proteome2_names.len(),
        )?;
        check_side(
            "data2",
            &self.proteome2_names,
            &self.proteome2_map,
            &self.data2,
            self.proteome1_names.len(),
        )
    }
}

fn position_map(names: &[String]) -> BTreeMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(pos, name)| (name.clone(), pos))
        .collect()
}

fn check_side(
    label: &str,
    names: &[String],
    map: &BTreeMap<String, usize>,
    data: &[Vec<HitTuple>],
    partner_count: usize,
) -> Result<()> {
    if data.len() != names.len() {
        return Err(GenomeCmpError::Consistency(format!(
            "{} has {} entries for {} proteins",
            label,
            data.len(),
            names.len()
        )));
    }
    if map.len() != names.len() || names.iter().enumerate().any(|(pos, n)| map.get(n) != Some(&pos)) {
        return Err(GenomeCmpError::Consistency(format!(
            "Position map for {} does not match its name array",
            label
        )));
    }
    for (pos, hits) in data.iter().enumerate() {
        if let Some(bad) = hits.iter().find(|h| h.partner_index() >= partner_count) {
            return Err(GenomeCmpError::Consistency(format!(
                "{}[{}] points at partner {} but only {} exist",
                label,
                pos,
                bad.partner_index(),
                partner_count
            )));
        }
    }
    Ok(())
}
