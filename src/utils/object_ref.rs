use crate::GenomeCmpError;
use std::fmt;

/// A reference to a stored object in the format "workspace/name"
///
/// # Examples
/// - "genomes/ecoli_k12" -> ("genomes", "ecoli_k12")
/// - "results/ecoli_vs_salmonella" -> ("results", "ecoli_vs_salmonella")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub workspace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn parse(input: &str) -> Result<Self, GenomeCmpError> {
        let parts: Vec<&str> = input.split('/').collect();

        if parts.len() != 2 {
            return Err(GenomeCmpError::Storage(format!(
                "Invalid object reference '{}'. Expected format: workspace/name (e.g., genomes/ecoli_k12)",
                input
            )));
        }

        let workspace = parts[0].trim();
        let name = parts[1].trim();

        if workspace.is_empty() || name.is_empty() {
            return Err(GenomeCmpError::Storage(format!(
                "Invalid object reference '{}'. Both workspace and name must be non-empty",
                input
            )));
        }

        for segment in [workspace, name] {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(GenomeCmpError::Storage(format!(
                    "Invalid object reference '{}'. Segment '{}' is not allowed",
                    input, segment
                )));
            }
        }

        Ok(Self {
            workspace: workspace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.name)
    }
}

impl std::str::FromStr for ObjectRef {
    type Err = GenomeCmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
