//! Data-quality snapshots.
//!
//! A `QualityReport` is a cheap descriptive summary of a frame, embedded in
//! the load report and the pipeline run report.

use crate::error::Result;
use crate::utils::{is_numeric_dtype, total_null_count};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive quality summary of a table at one point in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub duplicate_rows: usize,
    pub total_missing_values: usize,
    /// Null count per column, only columns that have any.
    pub missing_values: BTreeMap<String, usize>,
    /// Column name to dtype string.
    pub data_types: BTreeMap<String, String>,
    pub numeric_columns: Vec<String>,
    pub text_columns: Vec<String>,
}

impl QualityReport {
    /// Compute a quality snapshot of the given frame.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let unique = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let duplicate_rows = df.height() - unique.height();

        let mut missing_values = BTreeMap::new();
        let mut data_types = BTreeMap::new();
        let mut numeric_columns = Vec::new();
        let mut text_columns = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let nulls = col.null_count();
            if nulls > 0 {
                missing_values.insert(name.clone(), nulls);
            }
            data_types.insert(name.clone(), col.dtype().to_string());
            if is_numeric_dtype(col.dtype()) {
                numeric_columns.push(name);
            } else if col.dtype() == &DataType::String {
                text_columns.push(name);
            }
        }

        Ok(Self {
            total_rows: df.height(),
            total_columns: df.width(),
            duplicate_rows,
            total_missing_values: total_null_count(df),
            missing_values,
            data_types,
            numeric_columns,
            text_columns,
        })
    }
}
