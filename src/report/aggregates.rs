//! Descriptive aggregates over the cleaned catalog.
//!
//! Everything here is purely derivative of the frame contents; the stats
//! struct feeds both the chart renderer and the markdown report.

use crate::error::Result;
use crate::utils::{f64_values, i32_values, utf8_values};
use polars::prelude::*;
use std::collections::HashMap;

/// Precomputed aggregates for charts and the analysis report.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub total_titles: usize,
    pub movies: usize,
    pub tv_shows: usize,
    pub type_counts: Vec<(String, u32)>,

    /// Titles added per date_added year, ascending by year.
    pub titles_per_year: Vec<(i32, u32)>,
    /// Titles added per calendar month (1..=12), ascending.
    pub titles_per_month: Vec<(i32, u32)>,
    /// Titles added per weekday name, by count descending.
    pub titles_per_weekday: Vec<(String, u32)>,
    pub decade_counts: Vec<(i32, u32)>,
    pub earliest_release: Option<f64>,
    pub latest_release: Option<f64>,
    pub avg_content_age: Option<f64>,
    pub content_ages: Vec<f64>,

    pub top_countries: Vec<(String, u32)>,
    pub unique_countries: usize,
    pub international_titles: usize,

    pub top_genres: Vec<(String, u32)>,
    pub unique_genres: usize,
    pub genre_diversity: Vec<(u32, u32)>,
    pub rating_categories: Vec<(String, u32)>,

    pub movie_durations: Vec<f64>,
    pub avg_movie_duration: Option<f64>,
    pub season_counts: Vec<(u32, u32)>,

    pub total_missing_values: usize,
    pub missing_by_column: Vec<(String, usize)>,
}

/// How many entries the top-N groupings keep.
pub const TOP_N: usize = 15;

/// Compute all aggregates in one pass over the frame.
pub fn compute(df: &DataFrame) -> Result<CatalogStats> {
    let mut stats = CatalogStats {
        total_titles: df.height(),
        ..Default::default()
    };

    stats.type_counts = string_value_counts(df, "type")?;
    stats.movies = count_true(df, "is_movie")?;
    stats.tv_shows = count_true(df, "is_tv_show")?;

    stats.titles_per_year = int_value_counts_sorted(df, "date_added_year")?;
    stats.titles_per_month = int_value_counts_sorted(df, "date_added_month")?;
    stats.titles_per_weekday = string_value_counts(df, "date_added_day_of_week")?;
    stats.decade_counts = int_value_counts_sorted(df, "decade")?;

    let release_years: Vec<f64> = f64_values(df, "release_year")?.into_iter().flatten().collect();
    stats.earliest_release = release_years.iter().copied().reduce(f64::min);
    stats.latest_release = release_years.iter().copied().reduce(f64::max);

    stats.content_ages = f64_values(df, "content_age_when_added")?
        .into_iter()
        .flatten()
        .filter(|age| *age >= 0.0)
        .collect();
    stats.avg_content_age = mean(&stats.content_ages);

    let countries = string_value_counts(df, "primary_country")?;
    stats.unique_countries = countries.len();
    stats.top_countries = countries.into_iter().take(TOP_N).collect();
    stats.international_titles = count_true(df, "is_international")?;

    let genres = string_value_counts(df, "primary_genre")?;
    stats.unique_genres = genres.len();
    stats.top_genres = genres.into_iter().take(TOP_N).collect();

    let diversity = i32_values(df, "genre_diversity")?;
    let mut diversity_counts: HashMap<u32, u32> = HashMap::new();
    for value in diversity.into_iter().flatten() {
        *diversity_counts.entry(value as u32).or_insert(0) += 1;
    }
    stats.genre_diversity = sorted_by_key(diversity_counts);

    stats.rating_categories = string_value_counts(df, "rating_category")?;

    // Duration splits by the movie/series flags.
    let durations = f64_values(df, "duration_value")?;
    let movie_flags = bool_values(df, "is_movie")?;
    let tv_flags = bool_values(df, "is_tv_show")?;
    let mut seasons: HashMap<u32, u32> = HashMap::new();
    for ((duration, is_movie), is_tv) in durations.iter().zip(&movie_flags).zip(&tv_flags) {
        let Some(value) = duration else { continue };
        if is_movie.unwrap_or(false) {
            stats.movie_durations.push(*value);
        } else if is_tv.unwrap_or(false) {
            *seasons.entry(*value as u32).or_insert(0) += 1;
        }
    }
    stats.avg_movie_duration = mean(&stats.movie_durations);
    stats.season_counts = sorted_by_key(seasons);

    for col in df.get_columns() {
        let nulls = col.null_count();
        stats.total_missing_values += nulls;
        if nulls > 0 {
            stats.missing_by_column.push((col.name().to_string(), nulls));
        }
    }

    Ok(stats)
}

/// Value counts of a string column, descending by count.
pub fn string_value_counts(df: &DataFrame, name: &str) -> Result<Vec<(String, u32)>> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for value in utf8_values(df, name)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, u32)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(pairs)
}

/// Value counts of an integer column, ascending by value.
fn int_value_counts_sorted(df: &DataFrame, name: &str) -> Result<Vec<(i32, u32)>> {
    let mut counts: HashMap<i32, u32> = HashMap::new();
    for value in i32_values(df, name)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    Ok(sorted_by_key(counts))
}

fn bool_values(df: &DataFrame, name: &str) -> Result<Vec<Option<bool>>> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.bool()?.into_iter().collect())
}

fn count_true(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(bool_values(df, name)?
        .into_iter()
        .filter(|v| v.unwrap_or(false))
        .count())
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sorted_by_key<K: Ord + Copy>(counts: HashMap<K, u32>) -> Vec<(K, u32)> {
    let mut pairs: Vec<(K, u32)> = counts.into_iter().collect();
    pairs.sort_by_key(|(k, _)| *k);
    pairs
}
