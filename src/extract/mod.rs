//! Extraction of the raw catalog table from delimited files.
//!
//! The extractor reads the source file as UTF-8 and, when that fails to
//! decode, retries the same bytes under a Latin-1-compatible fallback before
//! giving up. Every column is read as text; type coercion belongs to the
//! transformation passes, not the reader.

pub mod api;

use crate::error::{PipelineError, Result};
use crate::schema::REQUIRED_COLUMNS;
use encoding_rs::WINDOWS_1252;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

/// Read the catalog CSV into a DataFrame, validating its shape.
///
/// # Errors
///
/// Returns [`PipelineError::Input`] when the file is missing or undecodable
/// under both encodings, [`PipelineError::EmptyDataset`] for a row-less
/// file, and [`PipelineError::MissingColumns`] when required columns are
/// absent. Never returns partially loaded data.
pub fn read_catalog_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::Input(format!(
            "Catalog file not found: {}",
            path.display()
        )));
    }

    info!("Starting extraction from: {}", path.display());
    let bytes = std::fs::read(path)?;

    let content = match std::str::from_utf8(&bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("UTF-8 decode failed, retrying with latin-1 fallback");
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(PipelineError::Input(format!(
                    "File undecodable under utf-8 and latin-1: {}",
                    path.display()
                )));
            }
            info!("Decoded {} bytes with latin-1 fallback", bytes.len());
            decoded.into_owned()
        }
    };

    let df = parse_csv_text(content)?;
    validate_catalog_frame(&df)?;

    info!(
        "Successfully extracted {} titles ({} columns) from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Parse CSV text into a DataFrame with every column typed as string.
fn parse_csv_text(content: String) -> Result<DataFrame> {
    let cursor = Cursor::new(content);
    let df = CsvReadOptions::default()
        .with_has_header(true)
        // Zero inference keeps every column as text for the cleaning passes.
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(cursor)
        .finish()?;
    Ok(df)
}

/// Validate that a frame is non-empty and carries the full record shape.
pub fn validate_catalog_frame(df: &DataFrame) -> Result<()> {
    if df.height() == 0 {
        return Err(PipelineError::EmptyDataset);
    }

    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.iter().any(|p| p == *col))
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }

    info!(
        "Catalog shape validation passed: {} rows, {} columns",
        df.height(),
        df.width()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "show_id,type,title,director,cast,country,date_added,release_year,rating,duration,listed_in,description";

    fn write_temp_csv(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_valid_utf8_csv() {
        let csv = format!(
            "{HEADER}\ns1,Movie,Alpha,Jane Doe,Actor A,France,\"September 9, 2019\",2018,PG-13,90 min,Drama,A film.\n"
        );
        let file = write_temp_csv(csv.as_bytes());
        let df = read_catalog_csv(file.path()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 12);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Amélie" with a latin-1 encoded e-acute (0xE9), invalid as UTF-8.
        let mut csv = format!("{HEADER}\ns1,Movie,Am").into_bytes();
        csv.push(0xE9);
        csv.extend_from_slice(
            b"lie,Jane Doe,Actor A,France,\"September 9, 2019\",2018,PG-13,90 min,Drama,A film.\n",
        );
        let file = write_temp_csv(&csv);
        let df = read_catalog_csv(file.path()).unwrap();
        assert_eq!(df.height(), 1);
        let title = df
            .column("title")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(0)
            .unwrap()
            .to_string();
        assert_eq!(title, "Amélie");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = read_catalog_csv(Path::new("/no/such/file.csv")).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
    }

    #[test]
    fn test_missing_column_is_hard_failure() {
        let csv = "show_id,type,title\ns1,Movie,Alpha\n";
        let file = write_temp_csv(csv.as_bytes());
        let err = read_catalog_csv(file.path()).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => {
                assert!(cols.contains(&"duration".to_string()));
                assert!(cols.contains(&"rating".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let csv = format!("{HEADER}\n");
        let file = write_temp_csv(csv.as_bytes());
        let err = read_catalog_csv(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
    }
}
