//! Run configuration.
//!
//! Values come from an optional TOML file, then `TAXI__*` environment variables
//! (e.g. `TAXI__OUTPUT_DIR`, `TAXI__EXECUTION__CHUNK_SIZE`); unset keys take serde defaults.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError};
use serde::Deserialize;

use crate::execution::ExecutionOptions;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// Directory holding the vendor lookup and the yearly trip extracts.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Vendor lookup file name, relative to `input_dir`.
    #[serde(default = "default_vendor_lookup")]
    pub vendor_lookup: String,
    /// Glob matching the yearly trip extracts, relative to `input_dir`.
    #[serde(default = "default_trips_pattern")]
    pub trips_pattern: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub execution: ExecutionSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Worker threads; available parallelism when unset.
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Chunks processed at once across all stages; available parallelism when unset.
    #[serde(default)]
    pub max_in_flight_chunks: Option<usize>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_vendor_lookup() -> String {
    "data_vendor_lookup.csv".to_string()
}

fn default_trips_pattern() -> String {
    "data_nyctaxi_trips_*.json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_chunk_size() -> usize {
    4_096
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            num_threads: None,
            chunk_size: default_chunk_size(),
            max_in_flight_chunks: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            vendor_lookup: default_vendor_lookup(),
            trips_pattern: default_trips_pattern(),
            output_dir: default_output_dir(),
            execution: ExecutionSettings::default(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from `path` (if given) and the environment, then validate it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("TAXI")
                .separator("__")
                .try_parsing(true),
        );

        let settings: ReportConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(?settings, "loaded configuration");
        Ok(settings)
    }

    pub fn vendor_lookup_path(&self) -> PathBuf {
        self.input_dir.join(&self.vendor_lookup)
    }

    /// Glob pattern for the trip extracts, anchored at `input_dir`.
    ///
    /// Glob metacharacters in `input_dir` are escaped so they only match themselves.
    pub fn trips_glob(&self) -> String {
        let dir = glob::Pattern::escape(&self.input_dir.to_string_lossy());
        Path::new(&dir)
            .join(&self.trips_pattern)
            .to_string_lossy()
            .into_owned()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let exec = &self.execution;
        if exec.chunk_size == 0 {
            return Err(invalid("execution.chunk_size must be > 0"));
        }
        if exec.num_threads == Some(0) {
            return Err(invalid("execution.num_threads must be > 0 when set"));
        }
        if exec.max_in_flight_chunks == Some(0) {
            return Err(invalid("execution.max_in_flight_chunks must be > 0 when set"));
        }
        if self.trips_pattern.trim().is_empty() {
            return Err(invalid("trips_pattern must not be empty"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Message(message.to_string())
}

impl From<&ExecutionSettings> for ExecutionOptions {
    fn from(settings: &ExecutionSettings) -> Self {
        let defaults = ExecutionOptions::default();
        Self {
            num_threads: settings.num_threads.or(defaults.num_threads),
            chunk_size: settings.chunk_size,
            max_in_flight_chunks: settings
                .max_in_flight_chunks
                .unwrap_or(defaults.max_in_flight_chunks),
        }
    }
}
