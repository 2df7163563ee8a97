//! Configuration types for the catalog ETL pipeline.
//!
//! Configuration comes from two directions: a builder with a fluent API for
//! programmatic use, and `PipelineConfig::from_env()` which reads the
//! documented environment variables (a `.env` file is honored when the CLI
//! loads one via `dotenv`).

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Behavior when the destination table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WriteMode {
    /// Drop and recreate the table, replacing prior contents.
    #[default]
    Replace,
    /// Insert after the existing rows.
    Append,
    /// Abort the load if the table exists.
    Fail,
}

/// Configuration for a pipeline run.
///
/// Use [`PipelineConfig::builder()`] for programmatic setup or
/// [`PipelineConfig::from_env()`] to honor the environment surface.
///
/// # Environment variables
///
/// | Variable           | Default                  |
/// |--------------------|--------------------------|
/// | `DATABASE_URL`     | `sqlite://catalog.db`    |
/// | `CATALOG_CSV_PATH` | `data/catalog_titles.csv`|
/// | `TABLE_NAME`       | `catalog_titles`         |
/// | `BATCH_SIZE`       | `1000`                   |
/// | `RETRY_COUNT`      | `3`                      |
/// | `TIMEOUT_SECS`     | `30`                     |
/// | `OUTPUT_DIR`       | `output`                 |
/// | `LOG_LEVEL`        | `info`                   |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Connection URL for the destination store.
    pub database_url: String,

    /// Path to the source CSV file.
    pub source_path: PathBuf,

    /// Destination table name.
    pub table_name: String,

    /// Rows per INSERT batch during load.
    pub batch_size: usize,

    /// Attempts for the network extraction variant.
    pub retry_count: u32,

    /// Per-request timeout for the network extraction variant.
    pub timeout_secs: u64,

    /// Directory for charts, reports, and run artifacts.
    pub output_dir: PathBuf,

    /// Behavior when the destination table exists.
    pub write_mode: WriteMode,

    /// Upper bound for plausible release years is `reference_year + 2`.
    ///
    /// Injected rather than read from the clock inside the transform so
    /// output is deterministic under test.
    pub reference_year: i32,

    /// Whether to run the reporting stage at all.
    pub generate_reports: bool,

    /// When set, a reporting failure fails the whole run instead of being
    /// logged and skipped.
    pub require_reports: bool,

    /// Log verbosity for the CLI (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://catalog.db".to_string(),
            source_path: PathBuf::from("data/catalog_titles.csv"),
            table_name: "catalog_titles".to_string(),
            batch_size: 1000,
            retry_count: 3,
            timeout_secs: 30,
            output_dir: PathBuf::from("output"),
            write_mode: WriteMode::default(),
            reference_year: Local::now().year(),
            generate_reports: true,
            require_reports: false,
            log_level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Build a configuration from environment variables, falling back to
    /// the documented defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        let defaults = Self::default();
        let config = Self {
            database_url: env_or("DATABASE_URL", defaults.database_url),
            source_path: PathBuf::from(env_or(
                "CATALOG_CSV_PATH",
                defaults.source_path.to_string_lossy().to_string(),
            )),
            table_name: env_or("TABLE_NAME", defaults.table_name),
            batch_size: env_parsed("BATCH_SIZE", defaults.batch_size)?,
            retry_count: env_parsed("RETRY_COUNT", defaults.retry_count)?,
            timeout_secs: env_parsed("TIMEOUT_SECS", defaults.timeout_secs)?,
            output_dir: PathBuf::from(env_or(
                "OUTPUT_DIR",
                defaults.output_dir.to_string_lossy().to_string(),
            )),
            write_mode: defaults.write_mode,
            reference_year: defaults.reference_year,
            generate_reports: defaults.generate_reports,
            require_reports: defaults.require_reports,
            log_level: env_or("LOG_LEVEL", defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.batch_size == 0 {
            return Err(ConfigValidationError::InvalidBatchSize(self.batch_size));
        }

        if self.table_name.is_empty()
            || !self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigValidationError::InvalidTableName(
                self.table_name.clone(),
            ));
        }

        if self.reference_year < 1900 {
            return Err(ConfigValidationError::InvalidReferenceYear(
                self.reference_year,
            ));
        }

        Ok(())
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(
    key: &str,
    default: T,
) -> Result<T, ConfigValidationError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigValidationError::Unparseable {
                variable: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),

    #[error("Invalid table name: '{0}' (ASCII alphanumerics and underscores only)")]
    InvalidTableName(String),

    #[error("Invalid reference year: {0} (must be 1900 or later)")]
    InvalidReferenceYear(i32),

    #[error("Environment variable {variable} has unparseable value '{value}'")]
    Unparseable { variable: String, value: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    database_url: Option<String>,
    source_path: Option<PathBuf>,
    table_name: Option<String>,
    batch_size: Option<usize>,
    retry_count: Option<u32>,
    timeout_secs: Option<u64>,
    output_dir: Option<PathBuf>,
    write_mode: Option<WriteMode>,
    reference_year: Option<i32>,
    generate_reports: Option<bool>,
    require_reports: Option<bool>,
    log_level: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set the destination store URL.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set the source CSV path.
    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Set the destination table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Set the rows-per-INSERT batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Set the retry count for network extraction.
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Set the per-request timeout for network extraction.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the artifact output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the behavior when the destination table exists.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = Some(mode);
        self
    }

    /// Pin the reference year used to bound plausible release years.
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Enable or disable the reporting stage.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Treat reporting failures as fatal to the run.
    pub fn require_reports(mut self, require: bool) -> Self {
        self.require_reports = Some(require);
        self
    }

    /// Set the log verbosity.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            database_url: self.database_url.unwrap_or(defaults.database_url),
            source_path: self.source_path.unwrap_or(defaults.source_path),
            table_name: self.table_name.unwrap_or(defaults.table_name),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            retry_count: self.retry_count.unwrap_or(defaults.retry_count),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            write_mode: self.write_mode.unwrap_or_default(),
            reference_year: self.reference_year.unwrap_or(defaults.reference_year),
            generate_reports: self.generate_reports.unwrap_or(true),
            require_reports: self.require_reports.unwrap_or(false),
            log_level: self.log_level.unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.table_name, "catalog_titles");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.write_mode, WriteMode::Replace);
        assert!(config.generate_reports);
        assert!(!config.require_reports);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .database_url("sqlite::memory:")
            .table_name("titles_test")
            .batch_size(50)
            .write_mode(WriteMode::Append)
            .reference_year(2024)
            .build()
            .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.table_name, "titles_test");
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.write_mode, WriteMode::Append);
        assert_eq!(config.reference_year, 2024);
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let result = PipelineConfig::builder().batch_size(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidBatchSize(0)
        ));
    }

    #[test]
    fn test_validation_rejects_bad_table_name() {
        let result = PipelineConfig::builder()
            .table_name("titles; DROP TABLE users")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTableName(_)
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.table_name, deserialized.table_name);
        assert_eq!(config.write_mode, deserialized.write_mode);
    }
}
