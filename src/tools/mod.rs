pub mod blast;
pub mod traits;

pub use blast::BlastAligner;
pub use traits::{Aligner, HitStream, PairHit};
