/// Trait definitions for the external aligner boundary
///
/// The comparison only depends on receiving one record per aligned pair; how
/// the aligner finds and scores them is its own business.
use crate::bio::sequence::Proteome;
use crate::Result;

/// One raw record from the aligner, in BLAST tabular column order
#[derive(Debug, Clone, PartialEq)]
pub struct PairHit {
    pub id1: String,
    pub id2: String,
    pub identity: f64,
    pub alignment_length: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub subject_start: usize,
    pub subject_end: usize,
    /// Kept exactly as the aligner printed it
    pub evalue: String,
    pub bit_score: f64,
}

impl PairHit {
    /// Minimal hit carrying only the fields the reducer reads
    pub fn scored(id1: impl Into<String>, id2: impl Into<String>, bit_score: f64) -> Self {
        Self {
            id1: id1.into(),
            id2: id2.into(),
            identity: 0.0,
            alignment_length: 0,
            mismatches: 0,
            gap_opens: 0,
            query_start: 0,
            query_end: 0,
            subject_start: 0,
            subject_end: 0,
            evalue: "0.0".to_string(),
            bit_score,
        }
    }
}

/// Finite, single-pass stream of hits; errors surface as items
pub type HitStream = Box<dyn Iterator<Item = Result<PairHit>> + Send>;

/// Common interface for protein aligners
pub trait Aligner: Send + Sync {
    /// Get the name of this aligner
    fn name(&self) -> &str;

    /// Align every protein of `query` against every protein of `target`,
    /// reporting pairs whose E-value is at most `max_evalue`
    fn align(&self, query: &Proteome, target: &Proteome, max_evalue: &str) -> Result<HitStream>;

    /// Verify that the tool is properly installed
    fn verify_installation(&self) -> Result<()>;
}
