use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for dataset operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Convenience result type for report publishing.
pub type SinkResult<T> = Result<T, SinkError>;

/// Convenience result type for a full pipeline run.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across CSV and JSON ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The glob pattern used to discover input files is invalid.
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by a glob pattern could not be read.
    #[error("input discovery error: {0}")]
    Glob(#[from] glob::GlobError),

    /// A glob pattern matched no files.
    #[error("no input files match '{pattern}'")]
    NoInputFiles { pattern: String },

    /// The input does not conform to the provided schema (missing required fields/columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Several sources could not be combined into one dataset.
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// Error type returned by dataset operations.
///
/// Both variants are raised synchronously by the operation that detects them; no partial result
/// is produced.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// A referenced column does not exist, or a derived schema would be invalid.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// A comparison, join or aggregation mixes incompatible column types.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },
}

/// Error type returned by the execution engine.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The [`crate::execution::ExecutionOptions`] are unusable.
    #[error("invalid execution options: {message}")]
    InvalidOptions { message: String },

    /// The worker pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Error type returned while publishing reports.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying I/O error (creating, writing or renaming report files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Error type for a whole report run. Any variant aborts the run before output is published.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}
