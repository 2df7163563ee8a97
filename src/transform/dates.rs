//! Date normalization pass.
//!
//! Normalizes `date_added` to ISO-8601 text (nulling placeholders and
//! unparseable values), derives year/month/weekday, bounds `release_year`
//! to a plausible range, and buckets it into decades.

use crate::error::Result;
use crate::utils::{normalize_cell, utf8_values};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use tracing::{debug, info};

/// Accepted input layouts for `date_added`, tried in order.
const DATE_FORMATS: [&str; 3] = ["%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

pub(super) fn transform_dates(
    df: DataFrame,
    reference_year: i32,
    actions: &mut Vec<String>,
) -> Result<DataFrame> {
    info!("Transforming date columns");
    let mut df = df;

    let raw_dates = utf8_values(&df, "date_added")?;
    let parsed: Vec<Option<NaiveDate>> = raw_dates
        .iter()
        .map(|opt| {
            opt.as_deref()
                .and_then(normalize_cell_to_date)
        })
        .collect();

    let iso: Vec<Option<String>> = parsed
        .iter()
        .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let years: Vec<Option<i32>> = parsed.iter().map(|d| d.map(|d| d.year())).collect();
    let months: Vec<Option<i32>> = parsed
        .iter()
        .map(|d| d.map(|d| d.month() as i32))
        .collect();
    let weekdays: Vec<Option<String>> = parsed
        .iter()
        .map(|d| d.map(|d| d.format("%A").to_string()))
        .collect();

    let valid_dates = parsed.iter().filter(|d| d.is_some()).count();
    df.replace("date_added", Series::new("date_added".into(), iso))?;
    df.with_column(Series::new("date_added_year".into(), years))?;
    df.with_column(Series::new("date_added_month".into(), months))?;
    df.with_column(Series::new("date_added_day_of_week".into(), weekdays))?;

    actions.push(format!("Parsed date_added: {valid_dates} valid dates"));
    debug!("Processed date_added column: {} valid dates", valid_dates);

    // release_year: numeric coercion with plausibility bounds, then decades.
    let max_year = reference_year + 2;
    let raw_years = utf8_values(&df, "release_year")?;
    let bounded: Vec<Option<f64>> = raw_years
        .iter()
        .map(|opt| {
            opt.as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|y| *y >= crate::schema::MIN_RELEASE_YEAR as f64 && *y <= max_year as f64)
        })
        .collect();

    let decades: Vec<Option<i32>> = bounded
        .iter()
        .map(|opt| opt.map(|y| ((y / 10.0).floor() * 10.0) as i32))
        .collect();

    let valid_years = bounded.iter().filter(|y| y.is_some()).count();
    df.replace("release_year", Series::new("release_year".into(), bounded))?;
    df.with_column(Series::new("decade".into(), decades))?;

    actions.push(format!("Coerced release_year: {valid_years} valid years"));
    debug!("Processed release_year column: {} valid years", valid_years);

    Ok(df)
}

/// Trim, null placeholders, and parse a date cell.
fn normalize_cell_to_date(value: &str) -> Option<NaiveDate> {
    let cleaned = normalize_cell(value)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{f64_values, i32_values};

    fn frame(dates: Vec<Option<&str>>, years: Vec<Option<&str>>) -> DataFrame {
        df!(
            "date_added" => dates,
            "release_year" => years,
        )
        .unwrap()
    }

    #[test]
    fn test_date_parsing_and_derived_parts() {
        let df = frame(
            vec![Some("September 9, 2019"), Some(" nan"), Some("not a date"), None],
            vec![Some("2018"), Some("2019"), Some("2019"), Some("2019")],
        );
        let mut actions = Vec::new();
        let out = transform_dates(df, 2024, &mut actions).unwrap();

        let iso = crate::utils::utf8_values(&out, "date_added").unwrap();
        assert_eq!(iso[0], Some("2019-09-09".to_string()));
        assert_eq!(iso[1], None);
        assert_eq!(iso[2], None);
        assert_eq!(iso[3], None);

        let years = i32_values(&out, "date_added_year").unwrap();
        assert_eq!(years[0], Some(2019));
        let months = i32_values(&out, "date_added_month").unwrap();
        assert_eq!(months[0], Some(9));
        let weekdays = crate::utils::utf8_values(&out, "date_added_day_of_week").unwrap();
        // 2019-09-09 was a Monday.
        assert_eq!(weekdays[0], Some("Monday".to_string()));
    }

    #[test]
    fn test_release_year_bounds() {
        let df = frame(
            vec![None, None, None, None],
            vec![Some("1899"), Some("2027"), Some("2026"), Some("abc")],
        );
        let mut actions = Vec::new();
        let out = transform_dates(df, 2024, &mut actions).unwrap();

        let years = f64_values(&out, "release_year").unwrap();
        assert_eq!(years[0], None); // before 1900
        assert_eq!(years[1], None); // more than two years out
        assert_eq!(years[2], Some(2026.0)); // exactly reference + 2
        assert_eq!(years[3], None); // unparseable
    }

    #[test]
    fn test_decade_bucketing() {
        let df = frame(
            vec![None, None, None],
            vec![Some("1994"), Some("2005"), Some("2000")],
        );
        let mut actions = Vec::new();
        let out = transform_dates(df, 2024, &mut actions).unwrap();

        let decades = i32_values(&out, "decade").unwrap();
        assert_eq!(decades, vec![Some(1990), Some(2000), Some(2000)]);
    }
}
