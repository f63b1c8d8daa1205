//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] or, for several yearly extracts, [`ingest_glob`]
//! (both from [`unified`]), which:
//!
//! - auto-detect format by file extension (or you can override via [`IngestionOptions`])
//! - perform ingestion into an in-memory [`crate::types::DataSet`]
//! - optionally report success/warnings/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod json;
pub mod observability;
pub mod timestamp;
pub mod unified;

pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, IngestionWarning,
    TracingObserver,
};
pub use timestamp::parse_timestamp;
pub use unified::{ingest_from_path, ingest_glob, ingest_many, IngestionFormat, IngestionOptions};
