use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A protein produced by a coding feature, with its resolved genomic span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProteinRecord {
    pub name: String,
    pub sequence: String,
    pub contig: String,
    pub start: i64,
    pub stop: i64,
}

impl ProteinRecord {
    pub fn new(name: String, sequence: String, contig: String, start: i64, stop: i64) -> Self {
        Self {
            name,
            sequence,
            contig,
            start,
            stop,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn header(&self) -> String {
        format!(">{}", self.name)
    }
}

/// Ordered protein set of one genome.
///
/// Insertion order is the position order used by the comparison result.
/// A repeated name replaces the earlier sequence but keeps the earlier position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proteome {
    proteins: IndexMap<String, String>,
}

impl Proteome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ProteinRecord>,
    {
        let mut proteome = Self::new();
        for record in records {
            proteome.insert(record.name, record.sequence);
        }
        proteome
    }

    pub fn insert(&mut self, name: String, sequence: String) {
        self.proteins.insert(name, sequence);
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.proteins.contains_key(name)
    }

    pub fn sequence(&self, name: &str) -> Option<&str> {
        self.proteins.get(name).map(String::as_str)
    }

    /// Stable position of a protein, equal to its insertion order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.proteins.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.proteins.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.proteins
            .iter()
            .map(|(name, seq)| (name.as_str(), seq.as_str()))
    }

    pub fn total_residues(&self) -> usize {
        self.proteins.values().map(String::len).sum()
    }
}
