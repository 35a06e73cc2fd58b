pub mod error;
pub mod fields;
pub mod mutate;
pub mod phases;
pub mod pipeline;
pub mod publications;
pub mod source;
pub mod worker;

pub use error::ApplyError;
pub use pipeline::run as run_apply;
