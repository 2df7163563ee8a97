//! Network extraction variant.
//!
//! Pulls a JSON array of records from an HTTP endpoint with retry and
//! timeout, then flattens it into the same all-text frame the CSV reader
//! produces. Blocking client; this path is meant for one-shot batch use,
//! not for calling inside an async context.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Extract records from a JSON API endpoint.
///
/// Retries up to `config.retry_count` times with `config.timeout_secs` per
/// request. The response body must be a JSON array of flat objects.
pub fn extract_from_api(url: &str, config: &PipelineConfig) -> Result<DataFrame> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut last_error: Option<PipelineError> = None;

    for attempt in 1..=config.retry_count {
        info!(
            "API request attempt {}/{}: {}",
            attempt, config.retry_count, url
        );

        let outcome = client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Value>());

        match outcome {
            Ok(body) => {
                let df = json_records_to_frame(&body)?;
                info!("Successfully extracted {} records from API", df.height());
                return Ok(df);
            }
            Err(e) => {
                warn!("API request failed (attempt {}): {}", attempt, e);
                last_error = Some(PipelineError::Http(e));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        PipelineError::Input(format!(
            "Failed to extract data from API after {} attempts",
            config.retry_count
        ))
    }))
}

/// Flatten a JSON array of objects into an all-text DataFrame.
///
/// Column order follows the first record; records missing a key get a null.
/// Nested values are serialized back to JSON text.
pub fn json_records_to_frame(body: &Value) -> Result<DataFrame> {
    let records = body
        .as_array()
        .ok_or_else(|| PipelineError::Input("API response is not a JSON array".to_string()))?;

    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let first = records[0]
        .as_object()
        .ok_or_else(|| PipelineError::Input("API records must be JSON objects".to_string()))?;
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut series = Vec::with_capacity(columns.len());
    for col in &columns {
        let values: Vec<Option<String>> = records
            .iter()
            .map(|record| record.get(col).and_then(json_value_to_cell))
            .collect();
        series.push(Series::new(col.as_str().into(), values).into());
    }

    Ok(DataFrame::new(series)?)
}

fn json_value_to_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_records_to_frame() {
        let body = json!([
            {"show_id": "s1", "title": "Alpha", "release_year": 2018},
            {"show_id": "s2", "title": null, "release_year": 2020},
        ]);
        let df = json_records_to_frame(&body).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let titles = df
            .column("title")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(titles, vec![Some("Alpha".to_string()), None]);
    }

    #[test]
    fn test_non_array_body_rejected() {
        let err = json_records_to_frame(&json!({"rows": []})).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
    }

    #[test]
    fn test_empty_array_rejected() {
        let err = json_records_to_frame(&json!([])).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
    }
}
