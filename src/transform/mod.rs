//! Cleaning and enrichment of the catalog table.
//!
//! The transformer applies a fixed, ordered sequence of passes:
//!
//! 1. Basic cleaning (duplicates, critical-field drops)
//! 2. Date normalization and derived date parts
//! 3. Text normalization
//! 4. Feature engineering
//! 5. Categorical consolidation
//! 6. Final cleanup (dedup, sort, dense order)
//!
//! Every pass is total: a bad value in one row nulls or drops that row,
//! never the whole pipeline. Rows are only ever dropped, never invented,
//! so the output height is always <= the input height.

mod categorical;
mod dates;
mod features;
mod text;

use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Applies the cleaning and enrichment passes to a raw catalog frame.
pub struct Transformer {
    reference_year: i32,
}

impl Transformer {
    /// Create a transformer with an injected reference year.
    ///
    /// Release years beyond `reference_year + 2` are treated as implausible
    /// and coerced to missing.
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Run all passes in order.
    ///
    /// Returns the cleaned, feature-augmented frame along with the list of
    /// cleaning actions taken (for run reports).
    pub fn transform(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut actions = Vec::new();

        info!("Starting catalog transformation pipeline");
        let initial_rows = df.height();

        let df = self.basic_cleaning(df, &mut actions)?;
        let df = dates::transform_dates(df, self.reference_year, &mut actions)?;
        let df = text::clean_text_columns(df, &mut actions)?;
        let df = features::engineer_features(df, &mut actions)?;
        let df = categorical::consolidate_categories(df, &mut actions)?;
        let df = self.final_cleanup(df, &mut actions)?;

        info!(
            "Transformation complete: {} rows in, {} rows out",
            initial_rows,
            df.height()
        );
        Ok((df, actions))
    }

    /// Pass 1: drop exact duplicates and rows missing critical fields.
    fn basic_cleaning(&self, df: DataFrame, actions: &mut Vec<String>) -> Result<DataFrame> {
        info!("Performing basic data cleaning");

        let initial_rows = df.height();
        let mut df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let duplicates_removed = initial_rows - df.height();
        if duplicates_removed > 0 {
            actions.push(format!("Removed {duplicates_removed} duplicate rows"));
            debug!("Removed {} duplicate rows", duplicates_removed);
        }

        let before_critical = df.height();
        let mut mask: Option<BooleanChunked> = None;
        for col in crate::schema::CRITICAL_COLUMNS {
            let not_null = df.column(col)?.as_materialized_series().is_not_null();
            mask = Some(match mask {
                Some(m) => &m & &not_null,
                None => not_null,
            });
        }
        if let Some(mask) = mask {
            df = df.filter(&mask)?;
        }

        let critical_removed = before_critical - df.height();
        if critical_removed > 0 {
            actions.push(format!(
                "Removed {critical_removed} rows with missing critical fields"
            ));
            debug!("Removed {} rows with missing critical fields", critical_removed);
        }

        Ok(df)
    }

    /// Pass 6: dedup again, sort with missing keys last, dense row order.
    fn final_cleanup(&self, df: DataFrame, actions: &mut Vec<String>) -> Result<DataFrame> {
        info!("Performing final cleanup");

        let initial_rows = df.height();
        let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        if df.height() < initial_rows {
            actions.push(format!(
                "Removed {} duplicate rows in final cleanup",
                initial_rows - df.height()
            ));
        }

        // date_added is normalized to ISO-8601 text, so lexicographic order
        // is chronological. Stable sort, null keys after all present keys.
        let df = df.sort(
            ["date_added", "show_id"],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )?;

        actions.push("Sorted by date_added, show_id (missing dates last)".to_string());
        Ok(df)
    }
}
