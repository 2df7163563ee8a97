//! Reporting stage: aggregates, dashboards, and text artifacts.
//!
//! The reporter is purely derivative of the cleaned table. It renders the
//! chart dashboards, a markdown analysis report, and a fixed catalog of
//! example SQL queries into the output directory. Nothing here feeds back
//! into the pipeline.

pub mod aggregates;
pub mod charts;

pub use aggregates::CatalogStats;
pub use charts::ChartRenderer;

use crate::error::{PipelineError, Result};
use chrono::Local;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

/// Paths of the artifacts a reporting run produced.
#[derive(Debug, Clone, Default)]
pub struct ReportArtifacts {
    pub charts: Vec<PathBuf>,
    pub analysis_report: Option<PathBuf>,
    pub sql_examples: Option<PathBuf>,
}

/// Generates all reporting artifacts for a cleaned catalog frame.
pub struct Reporter {
    output_dir: PathBuf,
    table_name: String,
    timestamp: String,
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>, table_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            table_name: table_name.into(),
            timestamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Compute aggregates and write every artifact.
    ///
    /// Chart rendering failures are logged and skipped; only a failure to
    /// produce any artifact at all surfaces as a `Report` error.
    pub fn generate(&self, df: &DataFrame) -> Result<ReportArtifacts> {
        if df.height() == 0 {
            return Err(PipelineError::Report(
                "nothing to report on an empty table".to_string(),
            ));
        }

        info!("Generating catalog analysis artifacts");
        std::fs::create_dir_all(&self.output_dir)?;

        let stats = aggregates::compute(df)?;
        let mut artifacts = ReportArtifacts::default();

        let renderer = ChartRenderer::new(&self.output_dir, self.timestamp.as_str());
        match renderer.render_all(&stats) {
            Ok(paths) => artifacts.charts = paths,
            Err(e) => warn!("Chart rendering skipped: {}", e),
        }

        artifacts.analysis_report = Some(self.write_analysis_report(&stats)?);
        artifacts.sql_examples = Some(self.write_sql_examples()?);

        info!(
            "Reporting complete: {} charts, analysis report, SQL examples",
            artifacts.charts.len()
        );
        Ok(artifacts)
    }

    /// Write the markdown analysis report.
    fn write_analysis_report(&self, stats: &CatalogStats) -> Result<PathBuf> {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S");
        let movie_pct = if stats.total_titles > 0 {
            (stats.movies as f64 / stats.total_titles as f64) * 100.0
        } else {
            0.0
        };
        let intl_pct = if stats.total_titles > 0 {
            (stats.international_titles as f64 / stats.total_titles as f64) * 100.0
        } else {
            0.0
        };

        let mut report = format!(
            "# Catalog Analysis Report\nGenerated on: {generated}\n\n\
             ## Dataset Overview\n\
             - Total Content: {} titles\n\
             - Missing Values: {} across all columns\n\n\
             ## Content Type Analysis\n\
             - Movies: {} ({movie_pct:.1}%)\n\
             - Series: {} ({:.1}%)\n",
            stats.total_titles,
            stats.total_missing_values,
            stats.movies,
            stats.tv_shows,
            100.0 - movie_pct,
        );

        if let Some(avg) = stats.avg_movie_duration {
            report.push_str(&format!("- Average Movie Duration: {avg:.1} minutes\n"));
        }

        report.push_str("\n## Temporal Analysis\n");
        if let (Some(earliest), Some(latest)) = (stats.earliest_release, stats.latest_release) {
            report.push_str(&format!(
                "- Release Years: {:.0} - {:.0}\n",
                earliest, latest
            ));
        }
        if let Some(age) = stats.avg_content_age {
            report.push_str(&format!(
                "- Average Content Age When Added: {age:.1} years\n"
            ));
        }

        report.push_str(&format!(
            "\n## Geographic Analysis\n\
             - Countries Represented: {}\n\
             - International Co-productions: {} ({intl_pct:.1}%)\n",
            stats.unique_countries, stats.international_titles,
        ));
        if let Some((country, count)) = stats.top_countries.first() {
            report.push_str(&format!("- Top Content Producer: {country} ({count} titles)\n"));
        }

        report.push_str(&format!(
            "\n## Genre Analysis\n- Unique Primary Genres: {}\n",
            stats.unique_genres
        ));
        if let Some((genre, count)) = stats.top_genres.first() {
            report.push_str(&format!("- Most Popular Genre: {genre} ({count} titles)\n"));
        }

        report.push_str("\n## Rating Categories\n");
        for (category, count) in &stats.rating_categories {
            report.push_str(&format!("- {category}: {count} titles\n"));
        }

        if !stats.missing_by_column.is_empty() {
            report.push_str("\n## Data Quality Summary\n");
            for (column, count) in &stats.missing_by_column {
                let pct = (*count as f64 / stats.total_titles as f64) * 100.0;
                report.push_str(&format!("- {column}: {count} missing ({pct:.1}%)\n"));
            }
        }

        report.push_str(
            "\n---\nReport generated by the catalog ETL pipeline. Dashboards are\n\
             saved alongside this file as PNG images.\n",
        );

        let path = self
            .output_dir
            .join(format!("catalog_analysis_report_{}.md", self.timestamp));
        std::fs::write(&path, report)?;
        info!("Analysis report saved: {}", path.display());
        Ok(path)
    }

    /// Write the fixed example-query catalog for the destination table.
    fn write_sql_examples(&self) -> Result<PathBuf> {
        let table = &self.table_name;
        let queries = format!(
            "-- Catalog Analysis - Example SQL Queries\n\
             -- Generated by the catalog ETL pipeline\n\n\
             -- 1. Content overview by type\n\
             SELECT type, COUNT(*) AS content_count,\n\
             \x20      ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM {table}), 2) AS percentage\n\
             FROM {table}\n\
             GROUP BY type;\n\n\
             -- 2. Top 10 countries by content count\n\
             SELECT primary_country, COUNT(*) AS content_count\n\
             FROM {table}\n\
             WHERE primary_country IS NOT NULL\n\
             GROUP BY primary_country\n\
             ORDER BY content_count DESC\n\
             LIMIT 10;\n\n\
             -- 3. Content added by year\n\
             SELECT date_added_year, COUNT(*) AS titles_added\n\
             FROM {table}\n\
             WHERE date_added_year IS NOT NULL\n\
             GROUP BY date_added_year\n\
             ORDER BY date_added_year;\n\n\
             -- 4. Most popular primary genres\n\
             SELECT primary_genre, COUNT(*) AS title_count\n\
             FROM {table}\n\
             WHERE primary_genre IS NOT NULL\n\
             GROUP BY primary_genre\n\
             ORDER BY title_count DESC\n\
             LIMIT 15;\n\n\
             -- 5. Average movie duration by decade\n\
             SELECT decade, AVG(duration_value) AS avg_duration_minutes, COUNT(*) AS movie_count\n\
             FROM {table}\n\
             WHERE is_movie = 1 AND decade IS NOT NULL AND duration_value IS NOT NULL\n\
             GROUP BY decade\n\
             ORDER BY decade;\n\n\
             -- 6. Content by rating category and type\n\
             SELECT rating_category, type, COUNT(*) AS content_count\n\
             FROM {table}\n\
             GROUP BY rating_category, type\n\
             ORDER BY rating_category, type;\n\n\
             -- 7. International vs domestic content by year\n\
             SELECT date_added_year,\n\
             \x20      SUM(CASE WHEN is_international = 1 THEN 1 ELSE 0 END) AS international_content,\n\
             \x20      SUM(CASE WHEN is_international = 0 THEN 1 ELSE 0 END) AS domestic_content\n\
             FROM {table}\n\
             WHERE date_added_year IS NOT NULL\n\
             GROUP BY date_added_year\n\
             ORDER BY date_added_year;\n\n\
             -- 8. Longest content by duration\n\
             SELECT title, type, duration_value, duration_unit, release_year\n\
             FROM {table}\n\
             WHERE duration_value IS NOT NULL\n\
             ORDER BY duration_value DESC\n\
             LIMIT 5;\n\n\
             -- 9. Content with the most diverse cast and crew\n\
             SELECT title, type, cast_count, director_count, country_count, genre_diversity\n\
             FROM {table}\n\
             ORDER BY (cast_count + director_count + country_count + genre_diversity) DESC\n\
             LIMIT 10;\n\n\
             -- 10. Recent additions\n\
             SELECT title, type, primary_country, primary_genre, date_added,\n\
             \x20      release_year, content_age_when_added\n\
             FROM {table}\n\
             WHERE date_added >= '2020-01-01'\n\
             ORDER BY date_added DESC\n\
             LIMIT 20;\n"
        );

        let path = self
            .output_dir
            .join(format!("catalog_sql_queries_{}.sql", self.timestamp));
        std::fs::write(&path, queries)?;
        info!("SQL query examples saved: {}", path.display());
        Ok(path)
    }
}
