//! Chart rendering for the analysis dashboards.
//!
//! Renders one PNG per analysis category (content, temporal, geographic,
//! genre), each a 2x2 panel grid. Rendering failures are surfaced as
//! `Report` errors so the orchestrator can skip them without failing the
//! run.

use crate::error::{PipelineError, Result};
use crate::report::aggregates::CatalogStats;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type ChartResult = std::result::Result<(), Box<dyn std::error::Error>>;
type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const CHART_SIZE: (u32, u32) = (1400, 1000);
const BAR_COLOR: RGBColor = RGBColor(68, 114, 196);
const ACCENT_COLOR: RGBColor = RGBColor(197, 90, 17);

/// Renders the per-category dashboard PNGs.
pub struct ChartRenderer {
    output_dir: PathBuf,
    timestamp: String,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Render every dashboard, skipping individual charts that fail.
    ///
    /// Returns the paths of the charts that rendered successfully.
    pub fn render_all(&self, stats: &CatalogStats) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;

        let charts: [(&str, fn(&Path, &CatalogStats) -> ChartResult); 4] = [
            ("catalog_content_analysis", render_content),
            ("catalog_temporal_analysis", render_temporal),
            ("catalog_geographic_analysis", render_geographic),
            ("catalog_genre_analysis", render_genre),
        ];

        let mut rendered = Vec::new();
        for (name, render) in charts {
            let path = self
                .output_dir
                .join(format!("{}_{}.png", name, self.timestamp));
            match render(&path, stats) {
                Ok(()) => {
                    info!("Chart saved: {}", path.display());
                    rendered.push(path);
                }
                Err(e) => {
                    warn!("Skipping chart {}: {}", name, e);
                }
            }
        }

        if rendered.is_empty() {
            return Err(PipelineError::Report(
                "no charts could be rendered".to_string(),
            ));
        }
        Ok(rendered)
    }
}

fn render_content(path: &Path, stats: &CatalogStats) -> ChartResult {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    let type_labels: Vec<String> = stats.type_counts.iter().map(|(l, _)| l.clone()).collect();
    let type_values: Vec<u32> = stats.type_counts.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[0], "Content Type Distribution", &type_labels, &type_values)?;

    let year_labels: Vec<String> = stats.titles_per_year.iter().map(|(y, _)| y.to_string()).collect();
    let year_values: Vec<u32> = stats.titles_per_year.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[1], "Titles Added by Year", &year_labels, &year_values)?;

    let duration_buckets = bucketize(&stats.movie_durations, 20.0);
    let bucket_labels: Vec<String> = duration_buckets.iter().map(|(b, _)| format!("{b}")).collect();
    let bucket_values: Vec<u32> = duration_buckets.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[2],
        "Movie Duration (minutes, 20-min buckets)",
        &bucket_labels,
        &bucket_values,
    )?;

    let season_labels: Vec<String> = stats.season_counts.iter().map(|(s, _)| s.to_string()).collect();
    let season_values: Vec<u32> = stats.season_counts.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[3], "Series Season Counts", &season_labels, &season_values)?;

    root.present()?;
    Ok(())
}

fn render_temporal(path: &Path, stats: &CatalogStats) -> ChartResult {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    draw_line(&panels[0], "Titles Added Over Time", &stats.titles_per_year)?;

    let decade_labels: Vec<String> = stats.decade_counts.iter().map(|(d, _)| format!("{d}s")).collect();
    let decade_values: Vec<u32> = stats.decade_counts.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[1], "Titles by Release Decade", &decade_labels, &decade_values)?;

    let age_buckets = bucketize(&stats.content_ages, 5.0);
    let age_labels: Vec<String> = age_buckets.iter().map(|(b, _)| format!("{b}")).collect();
    let age_values: Vec<u32> = age_buckets.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[2],
        "Content Age When Added (years, 5-year buckets)",
        &age_labels,
        &age_values,
    )?;

    let month_labels: Vec<String> = stats.titles_per_month.iter().map(|(m, _)| m.to_string()).collect();
    let month_values: Vec<u32> = stats.titles_per_month.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[3], "Titles Added by Month", &month_labels, &month_values)?;

    root.present()?;
    Ok(())
}

fn render_geographic(path: &Path, stats: &CatalogStats) -> ChartResult {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));

    let country_labels: Vec<String> = stats.top_countries.iter().map(|(c, _)| c.clone()).collect();
    let country_values: Vec<u32> = stats.top_countries.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[0],
        "Top Countries by Content Count",
        &country_labels,
        &country_values,
    )?;

    let single = stats.total_titles.saturating_sub(stats.international_titles) as u32;
    draw_bar(
        &panels[1],
        "International Co-productions",
        &["Single Country".to_string(), "Multiple Countries".to_string()],
        &[single, stats.international_titles as u32],
    )?;

    root.present()?;
    Ok(())
}

fn render_genre(path: &Path, stats: &CatalogStats) -> ChartResult {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    let genre_labels: Vec<String> = stats.top_genres.iter().map(|(g, _)| g.clone()).collect();
    let genre_values: Vec<u32> = stats.top_genres.iter().map(|(_, v)| *v).collect();
    draw_bar(&panels[0], "Top Primary Genres", &genre_labels, &genre_values)?;

    let diversity_labels: Vec<String> = stats.genre_diversity.iter().map(|(d, _)| d.to_string()).collect();
    let diversity_values: Vec<u32> = stats.genre_diversity.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[1],
        "Genres per Title",
        &diversity_labels,
        &diversity_values,
    )?;

    let rating_labels: Vec<String> = stats.rating_categories.iter().map(|(r, _)| r.clone()).collect();
    let rating_values: Vec<u32> = stats.rating_categories.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[2],
        "Titles by Rating Category",
        &rating_labels,
        &rating_values,
    )?;

    let weekday_labels: Vec<String> = stats.titles_per_weekday.iter().map(|(w, _)| w.clone()).collect();
    let weekday_values: Vec<u32> = stats.titles_per_weekday.iter().map(|(_, v)| *v).collect();
    draw_bar(
        &panels[3],
        "Titles Added by Weekday",
        &weekday_labels,
        &weekday_values,
    )?;

    root.present()?;
    Ok(())
}

/// Vertical bar chart over labeled categories. Empty data leaves the panel
/// blank rather than failing the whole dashboard.
fn draw_bar(panel: &Panel<'_>, title: &str, labels: &[String], values: &[u32]) -> ChartResult {
    if labels.is_empty() || values.iter().all(|v| *v == 0) {
        panel.clone().titled(title, ("sans-serif", 20))?;
        return Ok(());
    }

    let max = values.iter().copied().max().unwrap_or(1).max(1) as i32;
    let n = labels.len() as i32;

    let mut chart = ChartBuilder::on(panel)
        .caption(title, ("sans-serif", 22))
        .margin(14)
        .x_label_area_size(64)
        .y_label_area_size(56)
        .build_cartesian_2d(0..n, 0..(max + max / 5 + 1))?;

    let label_fmt = |x: &i32| -> String {
        labels
            .get(*x as usize)
            .cloned()
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().min(16))
        .x_label_formatter(&label_fmt)
        .y_desc("Titles")
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        Rectangle::new(
            [(i as i32, 0), (i as i32 + 1, *v as i32)],
            BAR_COLOR.filled(),
        )
    }))?;

    Ok(())
}

/// Line chart of (year, count) points.
fn draw_line(panel: &Panel<'_>, title: &str, points: &[(i32, u32)]) -> ChartResult {
    if points.is_empty() {
        panel.clone().titled(title, ("sans-serif", 20))?;
        return Ok(());
    }

    let x_min = points.first().map(|(x, _)| *x).unwrap_or(0);
    let x_max = points.last().map(|(x, _)| *x).unwrap_or(1).max(x_min + 1);
    let y_max = points.iter().map(|(_, y)| *y).max().unwrap_or(1).max(1) as i32;

    let mut chart = ChartBuilder::on(panel)
        .caption(title, ("sans-serif", 22))
        .margin(14)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(x_min..x_max + 1, 0..(y_max + y_max / 5 + 1))?;

    chart
        .configure_mesh()
        .y_desc("Titles")
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().map(|(x, y)| (*x, *y as i32)),
        ACCENT_COLOR.stroke_width(3),
    ))?;
    chart.draw_series(
        points
            .iter()
            .map(|(x, y)| Circle::new((*x, *y as i32), 4, ACCENT_COLOR.filled())),
    )?;

    Ok(())
}

/// Bucket raw values into fixed-width bins keyed by bin start.
fn bucketize(values: &[f64], width: f64) -> Vec<(i32, u32)> {
    let mut counts: std::collections::HashMap<i32, u32> = std::collections::HashMap::new();
    for value in values {
        let bucket = ((value / width).floor() * width) as i32;
        *counts.entry(bucket).or_insert(0) += 1;
    }
    let mut pairs: Vec<(i32, u32)> = counts.into_iter().collect();
    pairs.sort_by_key(|(b, _)| *b);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucketize() {
        let buckets = bucketize(&[5.0, 19.9, 20.0, 45.0], 20.0);
        assert_eq!(buckets, vec![(0, 2), (20, 1), (40, 1)]);
    }

    #[test]
    fn test_bucketize_empty() {
        assert!(bucketize(&[], 10.0).is_empty());
    }
}
