//! CLI entry point for the catalog ETL pipeline.

use anyhow::{Result, anyhow};
use catalog_etl::{
    EtlPipeline, PipelineConfig, Transformer, WriteMode, extract::read_catalog_csv,
    report::aggregates,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible write mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliWriteMode {
    /// Drop and recreate the destination table
    Replace,
    /// Insert after existing rows
    Append,
    /// Abort if the destination table exists
    Fail,
}

impl From<CliWriteMode> for WriteMode {
    fn from(cli: CliWriteMode) -> Self {
        match cli {
            CliWriteMode::Replace => WriteMode::Replace,
            CliWriteMode::Append => WriteMode::Append,
            CliWriteMode::Fail => WriteMode::Fail,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch ETL pipeline for media catalog datasets",
    long_about = "Cleans a media catalog CSV, loads it into SQLite, and renders\n\
                  analysis dashboards and reports.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  DATABASE_URL, CATALOG_CSV_PATH, TABLE_NAME, BATCH_SIZE,\n  \
                  RETRY_COUNT, TIMEOUT_SECS, OUTPUT_DIR, LOG_LEVEL\n\n\
                  EXAMPLES:\n  \
                  # Full run with defaults\n  \
                  catalog-etl -i catalog_titles.csv\n\n  \
                  # Preview without touching the store\n  \
                  catalog-etl -i catalog_titles.csv --dry-run\n\n  \
                  # Append into an existing table\n  \
                  catalog-etl -i catalog_titles.csv --write-mode append"
)]
struct Args {
    /// Path to the catalog CSV file (defaults to CATALOG_CSV_PATH)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for reports and dashboards
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Destination table name
    #[arg(short, long)]
    table: Option<String>,

    /// Destination database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Behavior when the destination table exists
    #[arg(long, value_enum, default_value = "replace")]
    write_mode: CliWriteMode,

    /// Rows per INSERT batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Reference year bounding plausible release years
    ///
    /// Defaults to the current year; pin it for reproducible output
    #[arg(long)]
    reference_year: Option<i32>,

    /// Skip chart and report generation
    #[arg(long)]
    no_reports: bool,

    /// Treat a reporting failure as a pipeline failure
    #[arg(long)]
    require_reports: bool,

    /// Preview extraction and transformation without loading
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);
    dotenv().ok();

    let config = build_config(&args)?;

    if !config.source_path.exists() {
        return Err(anyhow!(
            "Input file not found: {}",
            config.source_path.display()
        ));
    }

    if args.dry_run {
        return run_dry_run(&config);
    }

    let mut pipeline = EtlPipeline::new(config);
    match pipeline.run().await {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Merge CLI flags over the environment configuration.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let env_config = PipelineConfig::from_env()?;

    let mut builder = PipelineConfig::builder()
        .database_url(
            args.database_url
                .clone()
                .unwrap_or(env_config.database_url),
        )
        .source_path(args.input.clone().unwrap_or(env_config.source_path))
        .table_name(args.table.clone().unwrap_or(env_config.table_name))
        .batch_size(args.batch_size.unwrap_or(env_config.batch_size))
        .retry_count(env_config.retry_count)
        .timeout_secs(env_config.timeout_secs)
        .output_dir(args.output.clone().unwrap_or(env_config.output_dir))
        .write_mode(args.write_mode.into())
        .generate_reports(!args.no_reports)
        .require_reports(args.require_reports)
        .log_level(args.log_level.clone());

    if let Some(year) = args.reference_year {
        builder = builder.reference_year(year);
    }

    Ok(builder.build()?)
}

/// Preview what a run would do without touching the store.
///
/// Intentionally uses `println!`: this output is the whole point of
/// --dry-run and should not depend on log level.
fn run_dry_run(config: &PipelineConfig) -> Result<()> {
    println!("\n{}", "=".repeat(72));
    println!("DRY RUN - extraction and transformation preview");
    println!("{}\n", "=".repeat(72));

    let raw = read_catalog_csv(&config.source_path)?;
    println!("SOURCE");
    println!("{}", "-".repeat(40));
    println!("  File: {}", config.source_path.display());
    println!("  Rows: {}", raw.height());
    println!("  Columns: {}", raw.width());
    println!();

    let raw_rows = raw.height();
    let transformer = Transformer::new(config.reference_year);
    let (cleaned, actions) = transformer.transform(raw)?;

    println!("TRANSFORMATION");
    println!("{}", "-".repeat(40));
    println!("  Rows: {} -> {} ({} removed)", raw_rows, cleaned.height(), raw_rows - cleaned.height());
    println!("  Columns: {}", cleaned.width());
    for action in &actions {
        println!("  - {action}");
    }
    println!();

    let stats = aggregates::compute(&cleaned)?;
    println!("PREVIEW AGGREGATES");
    println!("{}", "-".repeat(40));
    println!("  Movies: {}  Series: {}", stats.movies, stats.tv_shows);
    println!("  Countries: {}  Genres: {}", stats.unique_countries, stats.unique_genres);
    if let Some((country, count)) = stats.top_countries.first() {
        println!("  Top country: {country} ({count} titles)");
    }
    println!();

    println!("PLANNED ACTIONS (skipped in dry run)");
    println!("{}", "-".repeat(40));
    println!(
        "  1. Load {} rows into '{}' ({:?} mode, batches of {})",
        cleaned.height(),
        config.table_name,
        config.write_mode,
        config.batch_size
    );
    if config.generate_reports {
        println!("  2. Render dashboards and reports into {}", config.output_dir.display());
    } else {
        println!("  2. Reporting disabled");
    }
    println!("\n{}", "=".repeat(72));
    println!("To execute this run, invoke again without --dry-run");
    println!("{}", "=".repeat(72));

    Ok(())
}

fn print_summary(report: &catalog_etl::RunReport) {
    println!();
    println!("{}", "=".repeat(72));
    println!("PIPELINE COMPLETE");
    println!("{}", "=".repeat(72));
    println!();
    println!("Source:  {} ({} rows)", report.source_file, report.raw_rows);
    println!(
        "Cleaned: {} rows ({} removed)",
        report.transformed_rows, report.rows_removed
    );
    println!(
        "Loaded:  {} rows into '{}' ({:.1}%)",
        report.loaded_rows, report.target_table, report.load_success_rate
    );
    println!("Duration: {:.2}s", report.duration_secs);
    if let Some(ref path) = report.report_path {
        println!("Run report: {}", path.display());
    }
    println!("{}", "=".repeat(72));

    info!("Catalog ETL pipeline completed successfully");
}
