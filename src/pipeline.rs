//! Pipeline orchestration.
//!
//! Runs Extract -> Transform -> Load -> Report in strict order, stopping at
//! the first stage failure. On success a timestamped JSON run report lands
//! in the output directory. There is exactly one in-flight run per
//! `EtlPipeline`; the table moves between stages by ownership transfer.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extract::read_catalog_csv;
use crate::load::{LoadOutcome, Loader};
use crate::quality::QualityReport;
use crate::report::{ReportArtifacts, Reporter};
use crate::transform::Transformer;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Where a pipeline run currently is, or where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    NotStarted,
    Extracting,
    Transforming,
    Loading,
    Reporting,
    Succeeded,
    FailedAt(String),
}

impl PipelineStage {
    fn fail(stage: &str) -> Self {
        Self::FailedAt(stage.to_string())
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub source_file: String,
    pub target_table: String,
    pub raw_rows: usize,
    pub transformed_rows: usize,
    pub rows_removed: usize,
    pub loaded_rows: usize,
    pub load_success_rate: f64,
    pub data_quality: QualityReport,
    pub cleaning_actions: Vec<String>,
    pub report_path: Option<PathBuf>,
}

/// The stateful sequencer for one end-to-end run.
pub struct EtlPipeline {
    config: PipelineConfig,
    stage: PipelineStage,
}

impl EtlPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stage: PipelineStage::NotStarted,
        }
    }

    /// Current stage of the pipeline.
    pub fn stage(&self) -> &PipelineStage {
        &self.stage
    }

    /// Execute the full pipeline.
    ///
    /// Stops at the first failing stage; the stage is recorded in
    /// [`EtlPipeline::stage`] and the error is returned as-is.
    pub async fn run(&mut self) -> Result<RunReport> {
        let start_wall = Local::now();
        let start = Instant::now();

        info!("{}", "=".repeat(72));
        info!("Starting catalog ETL pipeline");
        info!("{}", "=".repeat(72));

        // Step 1: Extract
        self.stage = PipelineStage::Extracting;
        info!("STEP 1: Extracting data");
        let raw = match read_catalog_csv(&self.config.source_path) {
            Ok(df) => df,
            Err(e) => return self.fail("extract", e),
        };
        let raw_rows = raw.height();

        // Step 2: Transform
        self.stage = PipelineStage::Transforming;
        info!("STEP 2: Transforming data");
        let transformer = Transformer::new(self.config.reference_year);
        let (cleaned, cleaning_actions) = match transformer.transform(raw) {
            Ok(result) => result,
            Err(e) => return self.fail("transform", e),
        };
        let transformed_rows = cleaned.height();
        info!(
            "Transformation summary: {} -> {} rows ({} removed)",
            raw_rows,
            transformed_rows,
            raw_rows - transformed_rows
        );

        // Step 3: Load
        self.stage = PipelineStage::Loading;
        info!("STEP 3: Loading data");
        let outcome = match self.load_stage(&cleaned).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail("load", e),
        };

        // Step 4: Report
        self.stage = PipelineStage::Reporting;
        let artifacts = if self.config.generate_reports {
            info!("STEP 4: Generating reports and dashboards");
            let reporter = Reporter::new(&self.config.output_dir, self.config.table_name.as_str());
            match reporter.generate(&cleaned) {
                Ok(artifacts) => artifacts,
                Err(e) if e.is_report_error() && !self.config.require_reports => {
                    warn!("Reporting failed and was skipped: {}", e);
                    ReportArtifacts::default()
                }
                Err(e) => return self.fail("report", e),
            }
        } else {
            info!("STEP 4: Reporting disabled, skipping");
            ReportArtifacts::default()
        };

        // Step 5: Run report
        let quality = match QualityReport::from_frame(&cleaned) {
            Ok(quality) => quality,
            Err(e) => return self.fail("report", e),
        };

        let end_wall = Local::now();
        let run_report = RunReport {
            start_time: start_wall.to_rfc3339(),
            end_time: end_wall.to_rfc3339(),
            duration_secs: start.elapsed().as_secs_f64(),
            source_file: self.config.source_path.display().to_string(),
            target_table: outcome.table.clone(),
            raw_rows,
            transformed_rows,
            rows_removed: raw_rows - transformed_rows,
            loaded_rows: outcome.loaded_rows,
            load_success_rate: outcome.success_ratio,
            data_quality: quality,
            cleaning_actions,
            report_path: None,
        };

        let run_report = match self.write_run_report(run_report, &artifacts) {
            Ok(report) => report,
            Err(e) => return self.fail("report", e),
        };

        self.stage = PipelineStage::Succeeded;
        info!("{}", "=".repeat(72));
        info!(
            "Pipeline completed successfully in {:.2}s",
            run_report.duration_secs
        );
        info!("{}", "=".repeat(72));

        Ok(run_report)
    }

    async fn load_stage(&self, cleaned: &polars::prelude::DataFrame) -> Result<LoadOutcome> {
        let loader = Loader::connect(
            &self.config.database_url,
            self.config.batch_size,
            &self.config.output_dir,
        )
        .await?;
        // The connection is scoped to this call and closed on every exit.
        let outcome = loader
            .load(cleaned, &self.config.table_name, self.config.write_mode)
            .await;
        loader.close().await;
        outcome
    }

    fn write_run_report(
        &self,
        mut report: RunReport,
        artifacts: &ReportArtifacts,
    ) -> Result<RunReport> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join(format!(
            "pipeline_report_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        ));

        let body = json!({
            "pipeline_execution": {
                "start_time": report.start_time,
                "end_time": report.end_time,
                "duration_seconds": report.duration_secs,
                "status": "SUCCESS",
            },
            "data_summary": {
                "source_file": report.source_file,
                "target_table": report.target_table,
                "raw_data_rows": report.raw_rows,
                "transformed_data_rows": report.transformed_rows,
                "loaded_rows": report.loaded_rows,
                "load_success_rate": report.load_success_rate,
                "data_quality": report.data_quality,
            },
            "cleaning_actions": report.cleaning_actions,
            "artifacts": {
                "charts": artifacts.charts,
                "analysis_report": artifacts.analysis_report,
                "sql_examples": artifacts.sql_examples,
            },
        });

        std::fs::write(&path, serde_json::to_string_pretty(&body)?)?;
        info!("Pipeline report saved: {}", path.display());

        report.report_path = Some(path);
        Ok(report)
    }

    fn fail<T>(&mut self, stage: &str, error: PipelineError) -> Result<T> {
        self.stage = PipelineStage::fail(stage);
        error!("Pipeline failed at {} stage: {}", stage, error);
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_starts_not_started() {
        let config = PipelineConfig::builder()
            .reference_year(2024)
            .build()
            .unwrap();
        let pipeline = EtlPipeline::new(config);
        assert_eq!(*pipeline.stage(), PipelineStage::NotStarted);
    }

    #[tokio::test]
    async fn test_missing_source_fails_at_extract() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder()
            .source_path(dir.path().join("missing.csv"))
            .database_url("sqlite::memory:")
            .output_dir(dir.path())
            .reference_year(2024)
            .build()
            .unwrap();

        let mut pipeline = EtlPipeline::new(config);
        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
        assert_eq!(
            *pipeline.stage(),
            PipelineStage::FailedAt("extract".to_string())
        );
    }
}
