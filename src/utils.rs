//! Shared helpers for the catalog ETL pipeline.
//!
//! Small column-materialization and string utilities used by several
//! transformation passes.

use crate::error::Result;
use crate::schema::is_placeholder;
use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Materialize a column as owned optional strings.
///
/// Non-string columns are cast to string first; the raw CSV is read with
/// every column as text, so this is usually a no-op cast.
pub fn utf8_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::String)?;
    let str_series = casted.str()?;
    Ok(str_series
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Materialize a numeric column as optional i32 values.
pub fn i32_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::Int32)?;
    Ok(casted.i32()?.into_iter().collect())
}

/// Materialize a numeric column as optional f64 values.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Trim a raw cell and collapse placeholder tokens to `None`.
pub fn normalize_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Rewrite a string column value-by-value.
///
/// The closure receives each non-null cell and returns the replacement
/// (or `None` to null it out); nulls stay null.
pub fn rewrite_string_column<F>(df: &mut DataFrame, name: &str, f: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let values = utf8_values(df, name)?;
    let rewritten: Vec<Option<String>> = values
        .iter()
        .map(|opt| opt.as_deref().and_then(&f))
        .collect();
    df.replace(name, Series::new(name.into(), rewritten))?;
    Ok(())
}

/// Number of comma-separated items in a list-like cell.
///
/// Missing cells count as zero items; a non-empty cell has
/// comma-count + 1 items.
pub fn list_item_count(value: Option<&str>) -> u32 {
    match value {
        Some(v) => v.matches(',').count() as u32 + 1,
        None => 0,
    }
}

/// First comma-separated token of a cell, trimmed.
pub fn primary_token(value: Option<&str>) -> Option<String> {
    value.map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
}

/// Total null count across all columns of a frame.
pub fn total_null_count(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cell() {
        assert_eq!(normalize_cell("  Drama "), Some("Drama".to_string()));
        assert_eq!(normalize_cell("nan"), None);
        assert_eq!(normalize_cell(" None "), None);
        assert_eq!(normalize_cell("   "), None);
        assert_eq!(normalize_cell("NaN"), Some("NaN".to_string()));
    }

    #[test]
    fn test_list_item_count() {
        assert_eq!(list_item_count(Some("France, Germany")), 2);
        assert_eq!(list_item_count(Some("Drama")), 1);
        assert_eq!(list_item_count(Some("a, b, c, d")), 4);
        assert_eq!(list_item_count(None), 0);
    }

    #[test]
    fn test_primary_token() {
        assert_eq!(
            primary_token(Some("France, Germany")),
            Some("France".to_string())
        );
        assert_eq!(primary_token(Some("Drama")), Some("Drama".to_string()));
        assert_eq!(primary_token(None), None);
    }

    #[test]
    fn test_rewrite_string_column() {
        let mut df = df!("title" => ["  A  ", "nan", "B"]).unwrap();
        rewrite_string_column(&mut df, "title", |v| normalize_cell(v)).unwrap();
        let values = utf8_values(&df, "title").unwrap();
        assert_eq!(
            values,
            vec![Some("A".to_string()), None, Some("B".to_string())]
        );
    }
}
