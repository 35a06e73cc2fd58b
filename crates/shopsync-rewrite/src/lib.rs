pub mod enrichment;
pub mod export;
pub mod import;

pub use enrichment::Enricher;
pub use export::export_field;
pub use import::{resolve_for_import, ImportResolution};
