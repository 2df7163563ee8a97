//! Fixed record shape of the catalog dataset.
//!
//! The pipeline is purpose-built for one schema: a catalog of movie and
//! series titles. The column sets and lookup tables here are static data,
//! not runtime configuration, so the cleaning passes stay declarative.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Columns every input file must carry. A missing column is a hard
/// validation failure in the extractor, not a warning.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "show_id",
    "type",
    "title",
    "director",
    "cast",
    "country",
    "date_added",
    "release_year",
    "rating",
    "duration",
    "listed_in",
    "description",
];

/// Rows missing any of these are dropped during basic cleaning.
pub const CRITICAL_COLUMNS: [&str; 3] = ["show_id", "title", "type"];

/// Free-text columns normalized by the text-cleaning pass.
pub const TEXT_COLUMNS: [&str; 7] = [
    "title",
    "director",
    "cast",
    "country",
    "rating",
    "listed_in",
    "description",
];

/// Comma-separated list columns that get per-row item counts.
pub const LIST_COLUMNS: [&str; 4] = ["cast", "director", "country", "listed_in"];

/// Low-cardinality columns flagged as categorical.
///
/// Storage hint only: the loader types them as TEXT and downstream reports
/// treat them as enumerable. Values stay plain strings in the frame.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "type",
    "rating",
    "rating_category",
    "duration_unit",
    "date_added_day_of_week",
];

/// Literal placeholder tokens that mean "missing".
///
/// Matching is case-sensitive and exact (after trimming); "NaN" or "NONE"
/// are real values as far as this pipeline is concerned.
pub const PLACEHOLDER_TOKENS: [&str; 3] = ["nan", "None", ""];

/// Release years below this bound are coerced to missing.
pub const MIN_RELEASE_YEAR: i32 = 1900;

/// Fixed rating-code to audience-category table.
static RATING_CATEGORIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("G", "Kids"),
        ("TV-Y", "Kids"),
        ("TV-Y7", "Kids"),
        ("TV-Y7-FV", "Kids"),
        ("PG", "Family"),
        ("TV-G", "Family"),
        ("TV-PG", "Family"),
        ("PG-13", "Teen"),
        ("TV-14", "Teen"),
        ("R", "Adult"),
        ("TV-MA", "Adult"),
        ("NC-17", "Adult"),
    ])
});

/// Map a rating code to its audience category.
///
/// Unmapped and missing codes both fall through to "Other".
pub fn rating_category(code: Option<&str>) -> &'static str {
    code.and_then(|c| RATING_CATEGORIES.get(c).copied())
        .unwrap_or("Other")
}

/// Check if a trimmed string is one of the literal placeholder tokens.
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_TOKENS.contains(&value)
}
