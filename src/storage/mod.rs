pub mod local;
pub mod memory;
pub mod traits;

pub use local::{FsJobStatus, FsObjectStore};
pub use memory::{MemoryJobStatus, MemoryObjectStore};
pub use traits::{JobStatusService, ObjectStore};
