pub mod object_ref;
pub mod parallel;

pub use object_ref::ObjectRef;
