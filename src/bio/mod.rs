pub mod fasta;
pub mod genome;
pub mod sequence;

pub use genome::{Feature, Genome, Location, Strand};
pub use sequence::{ProteinRecord, Proteome};
