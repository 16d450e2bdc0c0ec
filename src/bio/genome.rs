/// Stored genome object model
///
/// Genomes are read from the object store as JSON. Only the parts the
/// comparison needs are modelled; unknown fields are ignored.
use serde::{Deserialize, Serialize};

/// Feature kind kept for comparison
pub const CODING_FEATURE_TYPE: &str = "CDS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_translation: Option<String>,
    #[serde(default)]
    pub location: Vec<Location>,
}

impl Feature {
    pub fn is_coding(&self) -> bool {
        self.feature_type == CODING_FEATURE_TYPE
    }
}

/// One location segment: `[contig, position, strand, length]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location(pub String, pub i64, pub String, pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl std::str::FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(format!("Unknown strand: {:?}", s)),
        }
    }
}

impl Location {
    pub fn contig(&self) -> &str {
        &self.0
    }

    pub fn position(&self) -> i64 {
        self.1
    }

    pub fn strand(&self) -> Result<Strand, String> {
        self.2.parse()
    }

    pub fn length(&self) -> i64 {
        self.3
    }

    /// Absolute `(start, stop)` of the segment.
    ///
    /// Forward segments start at `position`; reverse segments end there.
    pub fn span(&self) -> Result<(i64, i64), String> {
        let position = self.position();
        let length = self.length();
        let span = match self.strand()? {
            Strand::Forward => position.checked_add(length).map(|stop| (position, stop)),
            Strand::Reverse => position.checked_sub(length).map(|start| (start, position)),
        };
        span.ok_or_else(|| {
            format!(
                "Location {}:{} with length {} is out of range",
                self.contig(),
                position,
                length
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_deserializes_from_array() {
        let feature: Feature = serde_json::from_str(
            r#"{"id": "f1", "type": "CDS", "protein_translation": "MK",
                "location": [["contig_1", 120, "-", 30]], "function": "kinase"}"#,
        )
        .unwrap();

        assert!(feature.is_coding());
        assert_eq!(feature.location[0].contig(), "contig_1");
        assert_eq!(feature.location[0].span().unwrap(), (90, 120));
    }

    #[test]
    fn test_forward_span() {
        let loc = Location("c".to_string(), 10, "+".to_string(), 5);
        assert_eq!(loc.span().unwrap(), (10, 15));
    }

    #[test]
    fn test_unknown_strand_rejected() {
        let loc = Location("c".to_string(), 10, "?".to_string(), 5);
        assert!(loc.span().is_err());
    }

    #[test]
    fn test_overflowing_span_rejected() {
        let forward = Location("c".to_string(), i64::MAX, "+".to_string(), 1);
        let reverse = Location("c".to_string(), i64::MIN, "-".to_string(), 1);

        assert!(forward.span().unwrap_err().contains("out of range"));
        assert!(reverse.span().unwrap_err().contains("out of range"));
    }
}
