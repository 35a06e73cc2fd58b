pub mod build;
pub mod index;

pub use build::IndexBuilder;
pub use index::{DestinationIndex, ExistingFile};
