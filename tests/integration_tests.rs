//! Integration tests for the catalog ETL pipeline.
//!
//! These tests verify end-to-end behavior across extraction,
//! transformation, loading, and reporting using small synthetic catalogs.

use catalog_etl::{
    EtlPipeline, PipelineConfig, PipelineStage, Transformer, WriteMode,
    extract::read_catalog_csv,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

const HEADER: &str = "show_id,type,title,director,cast,country,date_added,release_year,rating,duration,listed_in,description";

/// A 10-row catalog: rows 2 and 5 are exact duplicates of rows 1 and 4,
/// and row 10 is missing its identifier. Cleaning keeps 7 rows.
fn ten_row_catalog() -> String {
    let rows = [
        r#"s1,Movie,Alpha,Jane Doe,"Actor A, Actor B","France, Germany","September 9, 2019",2018,PG-13,90 min,"Drama, Thriller",A tense drama."#,
        r#"s1,Movie,Alpha,Jane Doe,"Actor A, Actor B","France, Germany","September 9, 2019",2018,PG-13,90 min,"Drama, Thriller",A tense drama."#,
        r#"s2,TV Show,Beta,,Actor C,Japan,"January 15, 2020",2019,TV-MA,3 Seasons,Anime,A quiet show."#,
        r#"s3,Movie,Gamma,Sam Lee,Actor D,Brazil,"March 5, 2018",2017,R,110 min,Comedy,Jokes abound."#,
        r#"s3,Movie,Gamma,Sam Lee,Actor D,Brazil,"March 5, 2018",2017,R,110 min,Comedy,Jokes abound."#,
        r#"s4,TV Show,Delta,,Actor E,India,"July 22, 2021",2021,TV-14,1 Season,Drama,New beginnings."#,
        r#"s5,Movie,Epsilon,Ana Cruz,"Actor F, Actor G",Mexico,"nan",1994,XYZ,95 min,"Action, Adventure",Explosions."#,
        r#"s6,Movie,Zeta,Li Wei,Actor H,China,"October 1, 2020",2005,PG,88 min,Family,Wholesome fun."#,
        r#"s7,TV Show,Eta,,Actor I,Spain,"February 28, 2022",2022,TV-G,2 Seasons,Reality,Unscripted."#,
        r#",Movie,Theta,Max Roe,Actor J,Italy,"June 10, 2019",2016,R,101 min,Horror,Scares."#,
    ];
    format!("{HEADER}\n{}\n", rows.join("\n"))
}

fn write_catalog_csv(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("catalog_titles.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn transformed_ten_rows() -> DataFrame {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog_csv(dir.path(), &ten_row_catalog());
    let raw = read_catalog_csv(&path).unwrap();
    let (cleaned, _) = Transformer::new(2024).transform(raw).unwrap();
    cleaned
}

// ============================================================================
// Transformer Tests
// ============================================================================

#[test]
fn test_ten_row_scenario_yields_seven_rows() {
    let cleaned = transformed_ten_rows();
    assert_eq!(cleaned.height(), 7);
}

#[test]
fn test_output_rows_never_exceed_input_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog_csv(dir.path(), &ten_row_catalog());
    let raw = read_catalog_csv(&path).unwrap();
    let input_rows = raw.height();
    let (cleaned, _) = Transformer::new(2024).transform(raw).unwrap();
    assert!(cleaned.height() <= input_rows);
}

#[test]
fn test_transformer_is_a_fixed_point_on_its_output() {
    let cleaned = transformed_ten_rows();
    let rows = cleaned.height();
    let (again, _) = Transformer::new(2024).transform(cleaned).unwrap();
    assert_eq!(again.height(), rows);
}

#[test]
fn test_every_derived_column_is_present() {
    let cleaned = transformed_ten_rows();
    let derived = [
        "date_added_year",
        "date_added_month",
        "date_added_day_of_week",
        "decade",
        "duration_value",
        "duration_unit",
        "is_movie",
        "is_tv_show",
        "cast_count",
        "director_count",
        "country_count",
        "listed_in_count",
        "content_age_when_added",
        "description_length",
        "description_word_count",
        "rating_category",
        "primary_country",
        "is_international",
        "primary_genre",
        "genre_diversity",
    ];
    for col in derived {
        assert!(
            cleaned.column(col).is_ok(),
            "derived column '{col}' missing"
        );
    }
}

#[test]
fn test_total_derived_columns_are_fully_populated() {
    let cleaned = transformed_ten_rows();
    // Columns whose derivation is total must have a value for every row.
    for col in [
        "is_movie",
        "is_tv_show",
        "cast_count",
        "director_count",
        "country_count",
        "listed_in_count",
        "genre_diversity",
        "is_international",
        "rating_category",
    ] {
        let nulls = cleaned.column(col).unwrap().null_count();
        assert_eq!(nulls, 0, "column '{col}' has {nulls} unexpected nulls");
    }
}

#[test]
fn test_missing_date_added_sorts_last() {
    let cleaned = transformed_ten_rows();
    let dates: Vec<Option<String>> = cleaned
        .column("date_added")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();

    // s5 has a placeholder date; it must be the final row.
    assert!(dates.last().unwrap().is_none());
    assert!(dates[..dates.len() - 1].iter().all(|d| d.is_some()));

    let presents: Vec<&String> = dates.iter().flatten().collect();
    let mut sorted = presents.clone();
    sorted.sort();
    assert_eq!(presents, sorted, "present dates must be ascending");
}

#[test]
fn test_feature_values_match_expectations() {
    let cleaned = transformed_ten_rows();

    // Locate s1 (sorted output, so find by id).
    let ids: Vec<Option<String>> = cleaned
        .column("show_id")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    let s1 = ids
        .iter()
        .position(|id| id.as_deref() == Some("s1"))
        .unwrap();

    let categories = cleaned
        .column("rating_category")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .get(s1)
        .unwrap()
        .to_string();
    assert_eq!(categories, "Teen");

    let duration = cleaned
        .column("duration_value")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .get(s1)
        .unwrap();
    assert_eq!(duration, 90.0);

    let primary = cleaned
        .column("primary_country")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .get(s1)
        .unwrap()
        .to_string();
    assert_eq!(primary, "France");

    let decade = cleaned
        .column("decade")
        .unwrap()
        .as_materialized_series()
        .i32()
        .unwrap()
        .get(s1)
        .unwrap();
    assert_eq!(decade, 2010);
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_full_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_catalog_csv(dir.path(), &ten_row_catalog());
    let db_path = dir.path().join("catalog.db");

    let config = PipelineConfig::builder()
        .source_path(&source)
        .database_url(format!("sqlite://{}", db_path.display()))
        .table_name("catalog_titles")
        .output_dir(dir.path().join("output"))
        .write_mode(WriteMode::Replace)
        .reference_year(2024)
        .batch_size(3)
        .build()
        .unwrap();

    let mut pipeline = EtlPipeline::new(config);
    let report = pipeline.run().await.unwrap();

    assert_eq!(*pipeline.stage(), PipelineStage::Succeeded);
    assert_eq!(report.raw_rows, 10);
    assert_eq!(report.transformed_rows, 7);
    assert_eq!(report.loaded_rows, 7);
    assert_eq!(report.load_success_rate, 100.0);

    // Run artifacts: pipeline report plus at least one load report.
    let output = dir.path().join("output");
    let entries: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(entries.iter().any(|f| f.starts_with("pipeline_report_")));
    assert!(entries.iter().any(|f| f.starts_with("load_report_")));
    assert!(
        entries
            .iter()
            .any(|f| f.starts_with("catalog_analysis_report_"))
    );
    assert!(entries.iter().any(|f| f.starts_with("catalog_sql_queries_")));
}

#[tokio::test]
async fn test_replace_mode_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_catalog_csv(dir.path(), &ten_row_catalog());
    let db_path = dir.path().join("catalog.db");

    let build = || {
        PipelineConfig::builder()
            .source_path(&source)
            .database_url(format!("sqlite://{}", db_path.display()))
            .output_dir(dir.path().join("output"))
            .reference_year(2024)
            .generate_reports(false)
            .build()
            .unwrap()
    };

    let first = EtlPipeline::new(build()).run().await.unwrap();
    let second = EtlPipeline::new(build()).run().await.unwrap();

    assert_eq!(first.loaded_rows, 7);
    assert_eq!(second.loaded_rows, 7);
}

#[tokio::test]
async fn test_append_mode_accumulates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_catalog_csv(dir.path(), &ten_row_catalog());
    let db_path = dir.path().join("catalog.db");

    let build = |mode: WriteMode| {
        PipelineConfig::builder()
            .source_path(&source)
            .database_url(format!("sqlite://{}", db_path.display()))
            .output_dir(dir.path().join("output"))
            .reference_year(2024)
            .write_mode(mode)
            .generate_reports(false)
            .build()
            .unwrap()
    };

    EtlPipeline::new(build(WriteMode::Replace))
        .run()
        .await
        .unwrap();
    let appended = EtlPipeline::new(build(WriteMode::Append))
        .run()
        .await
        .unwrap();

    // Append verifies growth by exactly the input height.
    assert_eq!(appended.loaded_rows, 7);
}

#[tokio::test]
async fn test_fail_mode_rejects_existing_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_catalog_csv(dir.path(), &ten_row_catalog());
    let db_path = dir.path().join("catalog.db");

    let build = |mode: WriteMode| {
        PipelineConfig::builder()
            .source_path(&source)
            .database_url(format!("sqlite://{}", db_path.display()))
            .output_dir(dir.path().join("output"))
            .reference_year(2024)
            .write_mode(mode)
            .generate_reports(false)
            .build()
            .unwrap()
    };

    EtlPipeline::new(build(WriteMode::Replace))
        .run()
        .await
        .unwrap();

    let mut pipeline = EtlPipeline::new(build(WriteMode::Fail));
    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_ERROR");
    assert_eq!(
        *pipeline.stage(),
        PipelineStage::FailedAt("load".to_string())
    );
}

#[tokio::test]
async fn test_malformed_source_stops_before_load() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_catalog_csv(dir.path(), "show_id,title\ns1,Alpha\n");
    let db_path = dir.path().join("never_created.db");

    let config = PipelineConfig::builder()
        .source_path(&source)
        .database_url(format!("sqlite://{}", db_path.display()))
        .output_dir(dir.path().join("output"))
        .reference_year(2024)
        .build()
        .unwrap();

    let mut pipeline = EtlPipeline::new(config);
    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.error_code(), "MISSING_COLUMNS");
    assert_eq!(
        *pipeline.stage(),
        PipelineStage::FailedAt("extract".to_string())
    );
    assert!(!db_path.exists(), "load must not run after a failed extract");
}
