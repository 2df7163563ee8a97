//! Feature engineering pass.
//!
//! Derives numeric, boolean, and categorical features from the cleaned
//! columns: duration value/unit, movie and series flags, list-item counts,
//! content age, description stats, and the audience rating category.

use crate::error::Result;
use crate::schema::{LIST_COLUMNS, rating_category};
use crate::utils::{i32_values, f64_values, list_item_count, utf8_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{debug, info};

static DURATION_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());
static DURATION_UNIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(min|Season|Seasons)$").unwrap());

/// Extract the numeric value and unit token from a duration string.
///
/// Only the literal suffixes "min", "Season", and "Seasons" count as units.
pub fn parse_duration(raw: &str) -> (Option<f64>, Option<&str>) {
    let value = DURATION_VALUE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    let unit = DURATION_UNIT_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    (value, unit)
}

pub(super) fn engineer_features(df: DataFrame, actions: &mut Vec<String>) -> Result<DataFrame> {
    info!("Engineering new features");
    let mut df = df;

    // Duration value + unit, and the movie/series flags the unit implies.
    let durations = utf8_values(&df, "duration")?;
    let mut values = Vec::with_capacity(durations.len());
    let mut units = Vec::with_capacity(durations.len());
    let mut is_movie = Vec::with_capacity(durations.len());
    let mut is_tv_show = Vec::with_capacity(durations.len());
    for opt in &durations {
        let (value, unit) = match opt.as_deref() {
            Some(raw) => parse_duration(raw),
            None => (None, None),
        };
        is_movie.push(unit == Some("min"));
        is_tv_show.push(matches!(unit, Some("Season") | Some("Seasons")));
        values.push(value);
        units.push(unit.map(|u| u.to_string()));
    }

    let movie_count = is_movie.iter().filter(|m| **m).count();
    let series_count = is_tv_show.iter().filter(|s| **s).count();
    df.with_column(Series::new("duration_value".into(), values))?;
    df.with_column(Series::new("duration_unit".into(), units))?;
    df.with_column(Series::new("is_movie".into(), is_movie))?;
    df.with_column(Series::new("is_tv_show".into(), is_tv_show))?;

    actions.push(format!(
        "Duration features: {movie_count} movies, {series_count} series"
    ));
    debug!("Duration features: {} movies, {} series", movie_count, series_count);

    // Item counts for list-like columns; missing cells count zero items.
    for col in LIST_COLUMNS {
        let cells = utf8_values(&df, col)?;
        let counts: Vec<u32> = cells.iter().map(|c| list_item_count(c.as_deref())).collect();
        df.with_column(Series::new(format!("{col}_count").as_str().into(), counts))?;
    }

    // Content age at the time the title was added.
    let added_years = i32_values(&df, "date_added_year")?;
    let release_years = f64_values(&df, "release_year")?;
    let ages: Vec<Option<f64>> = added_years
        .iter()
        .zip(&release_years)
        .map(|(added, release)| match (added, release) {
            (Some(a), Some(r)) => Some(*a as f64 - r),
            _ => None,
        })
        .collect();
    df.with_column(Series::new("content_age_when_added".into(), ages))?;

    // Description length and word count.
    let descriptions = utf8_values(&df, "description")?;
    let lengths: Vec<Option<u32>> = descriptions
        .iter()
        .map(|d| d.as_deref().map(|s| s.chars().count() as u32))
        .collect();
    let word_counts: Vec<Option<u32>> = descriptions
        .iter()
        .map(|d| d.as_deref().map(|s| s.split_whitespace().count() as u32))
        .collect();
    df.with_column(Series::new("description_length".into(), lengths))?;
    df.with_column(Series::new("description_word_count".into(), word_counts))?;

    // Audience category from the fixed rating table.
    let ratings = utf8_values(&df, "rating")?;
    let categories: Vec<String> = ratings
        .iter()
        .map(|r| rating_category(r.as_deref()).to_string())
        .collect();
    df.with_column(Series::new("rating_category".into(), categories))?;

    actions.push("Engineered duration, count, age, description, and rating features".to_string());
    info!("Feature engineering completed");
    Ok(df)
}
