/// Bidirectional best-hit reduction
///
/// Raw aligner hits are recorded from both endpoints, scored against the best
/// hit of either side, thresholded from the tail of each protein's list and
/// finally compressed into position-indexed tuples.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::bio::sequence::Proteome;
use crate::tools::traits::PairHit;
use crate::{GenomeCmpError, Result};

/// Guards against a ratio landing just under a rounding boundary
const ROUNDING_EPSILON: f64 = 1e-6;

/// A hit as seen from one protein
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedHit {
    pub partner: String,
    pub score: f64,
    pub percent_of_best_score: Option<i64>,
}

impl DirectedHit {
    fn new(partner: &str, score: f64) -> Self {
        Self {
            partner: partner.to_string(),
            score,
            percent_of_best_score: None,
        }
    }
}

/// `(partner position, score * 100, percent of best score)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitTuple(pub usize, pub i64, pub i64);

impl HitTuple {
    pub fn partner_index(&self) -> usize {
        self.0
    }

    pub fn scaled_score(&self) -> i64 {
        self.1
    }

    pub fn percent_of_best_score(&self) -> i64 {
        self.2
    }
}

/// Reduced hits for both genomes, aligned with their name arrays
#[derive(Debug, Clone, PartialEq)]
pub struct BbhData {
    pub names1: Vec<String>,
    pub names2: Vec<String>,
    pub hits1: Vec<Vec<HitTuple>>,
    pub hits2: Vec<Vec<HitTuple>>,
}

type DirectedHits = IndexMap<String, Vec<DirectedHit>>;

#[derive(Debug, Clone, Copy)]
pub struct BbhReducer {
    sub_bbh_percent: f64,
}

impl BbhReducer {
    pub fn new(sub_bbh_percent: f64) -> Self {
        Self { sub_bbh_percent }
    }

    pub fn sub_bbh_percent(&self) -> f64 {
        self.sub_bbh_percent
    }

    /// Consume the whole hit stream and reduce it against both proteomes
    pub fn reduce<I>(&self, hits: I, proteome1: &Proteome, proteome2: &Proteome) -> Result<BbhData>
    where
        I: IntoIterator<Item = Result<PairHit>>,
    {
        let (mut dir1, mut dir2) = collect_directed(hits, proteome1, proteome2)?;

        // Percentages are unset here, so only scores order the lists
        for list in dir1.values_mut().chain(dir2.values_mut()) {
            sort_hits(list);
        }

        let best1 = best_scores(&dir1);
        let best2 = best_scores(&dir2);
        let dropped1 = self.score_and_filter(&mut dir1, &best2);
        let dropped2 = self.score_and_filter(&mut dir2, &best1);
        debug!(
            proteins1 = dir1.len(),
            proteins2 = dir2.len(),
            dropped1,
            dropped2,
            "Applied sub-BBH threshold"
        );

        Ok(BbhData {
            names1: proteome1.names().map(str::to_string).collect(),
            names2: proteome2.names().map(str::to_string).collect(),
            hits1: to_tuples(&dir1, proteome1, proteome2)?,
            hits2: to_tuples(&dir2, proteome2, proteome1)?,
        })
    }

    /// Compute percentages for every list, drop weak tail hits and re-sort.
    /// Returns the number of hits dropped.
    fn score_and_filter(&self, own: &mut DirectedHits, partner_best: &IndexMap<String, f64>) -> usize {
        let mut dropped = 0;
        for list in own.values_mut() {
            let best_own = match list.first() {
                Some(top) => top.score,
                None => continue,
            };
            for hit in list.iter_mut() {
                let best_partner = partner_best.get(&hit.partner).copied().unwrap_or(0.0);
                hit.percent_of_best_score = Some(percent_of_best(hit.score, best_own, best_partner));
            }

            // The top hit is never dropped
            for pos in (1..list.len()).rev() {
                let percent = list[pos].percent_of_best_score.unwrap_or(0);
                if (percent as f64) < self.sub_bbh_percent {
                    list.remove(pos);
                    dropped += 1;
                }
            }
            sort_hits(list);
        }
        dropped
    }
}

/// `round(score * 100 / max(best_own, best_partner) + 1e-6)`, 0 when undefined
pub fn percent_of_best(score: f64, best_own: f64, best_partner: f64) -> i64 {
    round_half_up(score * 100.0 / best_own.max(best_partner) + ROUNDING_EPSILON)
}

// NaN maps to 0 through the saturating cast
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn compare_hits(a: &DirectedHit, b: &DirectedHit) -> Ordering {
    let by_score = b.score.total_cmp(&a.score);
    if by_score != Ordering::Equal {
        return by_score;
    }
    match (a.percent_of_best_score, b.percent_of_best_score) {
        (Some(pa), Some(pb)) => pb.cmp(&pa),
        _ => Ordering::Equal,
    }
}

fn sort_hits(list: &mut [DirectedHit]) {
    list.sort_by(compare_hits);
}

fn collect_directed<I>(
    hits: I,
    proteome1: &Proteome,
    proteome2: &Proteome,
) -> Result<(DirectedHits, DirectedHits)>
where
    I: IntoIterator<Item = Result<PairHit>>,
{
    let mut dir1 = DirectedHits::new();
    let mut dir2 = DirectedHits::new();
    let mut raw = 0usize;

    for hit in hits {
        let hit = hit?;
        if !proteome1.contains(&hit.id1) {
            return Err(GenomeCmpError::Consistency(format!(
                "Hit references protein {} which is not in genome 1",
                hit.id1
            )));
        }
        if !proteome2.contains(&hit.id2) {
            return Err(GenomeCmpError::Consistency(format!(
                "Hit references protein {} which is not in genome 2",
                hit.id2
            )));
        }

        dir1.entry(hit.id1.clone())
            .or_default()
            .push(DirectedHit::new(&hit.id2, hit.bit_score));
        dir2.entry(hit.id2)
            .or_default()
            .push(DirectedHit::new(&hit.id1, hit.bit_score));
        raw += 1;
    }

    debug!(raw_hits = raw, "Collected directed hits");
    Ok((dir1, dir2))
}

fn best_scores(hits: &DirectedHits) -> IndexMap<String, f64> {
    hits.iter()
        .filter_map(|(name, list)| list.first().map(|top| (name.clone(), top.score)))
        .collect()
}

fn to_tuples(
    hits: &DirectedHits,
    own: &Proteome,
    partner: &Proteome,
) -> Result<Vec<Vec<HitTuple>>> {
    own.names()
        .map(|name| {
            hits.get(name)
                .map(|list| {
                    list.iter()
                        .map(|hit| -> Result<HitTuple> {
                            let index = partner.position(&hit.partner).ok_or_else(|| {
                                GenomeCmpError::Consistency(format!(
                                    "No position for protein {}",
                                    hit.partner
                                ))
                            })?;
                            Ok(HitTuple(
                                index,
                                round_half_up(hit.score * 100.0),
                                hit.percent_of_best_score.unwrap_or(0),
                            ))
                        })
                        .collect::<Result<Vec<_>>>()
                })
                .unwrap_or_else(|| Ok(Vec::new()))
        })
        .collect()
}
