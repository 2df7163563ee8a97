//! Categorical consolidation pass.
//!
//! Records the low-cardinality hint for the designated columns and derives
//! the primary-country/primary-genre features with their multi-value flags.
//! The hint has no behavioral effect on values; the loader and reports
//! treat hinted columns as enumerable text.

use crate::error::Result;
use crate::schema::CATEGORICAL_COLUMNS;
use crate::utils::{list_item_count, primary_token, utf8_values};
use polars::prelude::*;
use tracing::{debug, info};

pub(super) fn consolidate_categories(
    df: DataFrame,
    actions: &mut Vec<String>,
) -> Result<DataFrame> {
    info!("Processing categorical data");
    let mut df = df;

    let hinted: Vec<&str> = CATEGORICAL_COLUMNS
        .iter()
        .copied()
        .filter(|col| df.column(col).is_ok())
        .collect();
    actions.push(format!("Marked {} columns as categorical: {hinted:?}", hinted.len()));
    debug!("Categorical hint applied to {:?}", hinted);

    // Primary country and the international co-production flag.
    let countries = utf8_values(&df, "country")?;
    let primary_country: Vec<Option<String>> = countries
        .iter()
        .map(|c| primary_token(c.as_deref()))
        .collect();
    let is_international: Vec<bool> = countries
        .iter()
        .map(|c| c.as_deref().is_some_and(|v| v.contains(',')))
        .collect();
    df.with_column(Series::new("primary_country".into(), primary_country))?;
    df.with_column(Series::new("is_international".into(), is_international))?;

    // Primary genre and genre diversity.
    let genres = utf8_values(&df, "listed_in")?;
    let primary_genre: Vec<Option<String>> = genres
        .iter()
        .map(|g| primary_token(g.as_deref()))
        .collect();
    let diversity: Vec<u32> = genres
        .iter()
        .map(|g| list_item_count(g.as_deref()))
        .collect();
    df.with_column(Series::new("primary_genre".into(), primary_genre))?;
    df.with_column(Series::new("genre_diversity".into(), diversity))?;

    actions.push("Derived primary country/genre and diversity features".to_string());
    Ok(df)
}
