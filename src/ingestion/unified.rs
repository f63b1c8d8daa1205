//! Unified ingestion entrypoints.
//!
//! - [`ingest_from_path`] ingests one file into an in-memory [`crate::types::DataSet`] using a
//!   provided [`crate::types::Schema`]. If [`IngestionOptions::format`] is `None`, the format is
//!   inferred from the file extension.
//! - [`ingest_many`] and [`ingest_glob`] ingest several files with one schema (e.g. one trip
//!   extract per year) and concatenate them into a single dataset.
//!
//! If an [`super::observability::IngestionObserver`] is provided, success/warning/failure/alerts
//! are reported to it, once per file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::concat;
use crate::types::{DataSet, Schema};

use super::observability::{
    IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, IngestionWarning,
};
use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array-of-objects, single object, or NDJSON.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_warning` with [`IngestionWarning::EmptyInput`] when the source has zero rows
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use taxi_trip_reports::ingestion::{ingest_from_path, IngestionOptions};
/// use taxi_trip_reports::pipeline::vendor_lookup_schema;
///
/// # fn main() -> Result<(), taxi_trip_reports::IngestionError> {
/// // Uses `.csv` to select CSV ingestion.
/// let ds = ingest_from_path("data_vendor_lookup.csv", &vendor_lookup_schema(), &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
///
/// Force a format when a file has no (or a misleading) extension:
///
/// ```no_run
/// use taxi_trip_reports::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
/// use taxi_trip_reports::pipeline::trips_schema;
///
/// # fn main() -> Result<(), taxi_trip_reports::IngestionError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Json),
///     ..Default::default()
/// };
/// let ds = ingest_from_path("trips_2009.txt", &trips_schema(), &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &IngestionOptions,
) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: fmt,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Json => json::ingest_json_from_path(path, schema),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => {
                obs.on_success(&ctx, IngestionStats { rows: ds.row_count() });
                if ds.is_empty() {
                    obs.on_warning(&ctx, IngestionWarning::EmptyInput);
                }
            }
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Ingest every path with the same schema and concatenate the rows, in path order.
///
/// An empty path list yields an empty dataset.
pub fn ingest_many<P: AsRef<Path>>(
    paths: &[P],
    schema: &Schema,
    options: &IngestionOptions,
) -> IngestionResult<DataSet> {
    let parts = paths
        .iter()
        .map(|p| ingest_from_path(p, schema, options))
        .collect::<IngestionResult<Vec<_>>>()?;
    if parts.is_empty() {
        return Ok(DataSet::empty(schema.clone()));
    }
    Ok(concat(parts)?)
}

/// Expand a glob `pattern` (sorted by path) and ingest the matches with [`ingest_many`].
///
/// Fails with [`IngestionError::NoInputFiles`] if nothing matches.
pub fn ingest_glob(
    pattern: &str,
    schema: &Schema,
    options: &IngestionOptions,
) -> IngestionResult<DataSet> {
    let mut paths = glob::glob(pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;
    if paths.is_empty() {
        return Err(IngestionError::NoInputFiles {
            pattern: pattern.to_string(),
        });
    }
    paths.sort();
    tracing::debug!(pattern, files = paths.len(), "expanded input pattern");
    ingest_many(&paths, schema, options)
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Glob(_) | IngestionError::NoInputFiles { .. } => {
            IngestionSeverity::Critical
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Pattern(_)
        | IngestionError::SchemaMismatch { .. }
        | IngestionError::ParseError { .. }
        | IngestionError::Processing(_) => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
