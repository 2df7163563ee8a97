//! Text normalization pass.
//!
//! Every designated free-text column is coerced to text, stripped of
//! surrounding whitespace, and nulled when it holds a literal placeholder
//! token or nothing but whitespace.

use crate::error::Result;
use crate::schema::TEXT_COLUMNS;
use crate::utils::{normalize_cell, rewrite_string_column};
use polars::prelude::*;
use tracing::info;

pub(super) fn clean_text_columns(df: DataFrame, actions: &mut Vec<String>) -> Result<DataFrame> {
    info!("Cleaning text columns");
    let mut df = df;

    for col in TEXT_COLUMNS {
        rewrite_string_column(&mut df, col, |v| normalize_cell(v))?;
    }

    // duration gets the same treatment ahead of feature extraction.
    rewrite_string_column(&mut df, "duration", |v| normalize_cell(v))?;

    actions.push(format!(
        "Normalized {} text columns",
        TEXT_COLUMNS.len() + 1
    ));
    Ok(df)
}
