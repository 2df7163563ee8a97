//! Catalog ETL Pipeline Library
//!
//! A batch data-cleaning and reporting pipeline for media catalog datasets,
//! built on Polars.
//!
//! # Overview
//!
//! The pipeline runs four stages in strict order:
//!
//! - **Extract**: read a delimited catalog file (UTF-8 with a Latin-1
//!   fallback) and validate its fixed record shape
//! - **Transform**: apply the ordered cleaning and enrichment passes
//!   (duplicates, dates, text, features, categoricals, final sort)
//! - **Load**: bulk-insert the cleaned table into SQLite in bounded
//!   batches, verify the row count, and write a JSON load report
//! - **Report**: render chart dashboards plus markdown and SQL artifacts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use catalog_etl::{EtlPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .source_path("data/catalog_titles.csv")
//!     .database_url("sqlite://catalog.db")
//!     .table_name("catalog_titles")
//!     .build()?;
//!
//! let mut pipeline = EtlPipeline::new(config);
//! let report = pipeline.run().await?;
//! println!("Loaded {} rows ({:.0}%)", report.loaded_rows, report.load_success_rate);
//! ```
//!
//! The stages are also usable on their own:
//!
//! ```rust,ignore
//! use catalog_etl::{extract::read_catalog_csv, Transformer};
//!
//! let raw = read_catalog_csv("catalog.csv".as_ref())?;
//! let (cleaned, actions) = Transformer::new(2024).transform(raw)?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod schema;
pub mod transform;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder, WriteMode};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use load::{LoadOutcome, Loader};
pub use pipeline::{EtlPipeline, PipelineStage, RunReport};
pub use quality::QualityReport;
pub use report::{CatalogStats, ChartRenderer, ReportArtifacts, Reporter};
pub use transform::Transformer;
