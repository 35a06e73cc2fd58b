pub mod error;
pub mod reconstruct;
pub mod runtime;

pub use error::BulkError;
pub use reconstruct::{gid_type, FieldMap, Reconstructor};
pub use runtime::BulkRuntime;
