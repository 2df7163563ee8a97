//! Loading the cleaned table into the relational store.
//!
//! The loader infers a SQLite schema from the frame's dtypes, writes rows
//! in bounded-size batches, verifies the row count after the fact, and
//! drops a JSON load report next to the other run artifacts. From the
//! caller's viewpoint the load either succeeds completely or fails; the
//! batched writes underneath are not transactional across the whole table.

use crate::config::WriteMode;
use crate::error::{PipelineError, Result};
use crate::quality::QualityReport;
use crate::utils::is_numeric_dtype;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite's default variable limit caps how many rows fit in one INSERT.
const MAX_BIND_VARIABLES: usize = 32_000;

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub table: String,
    pub source_rows: usize,
    pub loaded_rows: usize,
    /// Loaded rows as a percentage of source rows.
    pub success_ratio: f64,
    pub report_path: Option<PathBuf>,
}

/// A frame column materialized into bindable cells.
enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    fn sql_type(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::Bool(_) => "INTEGER",
            Self::Float(_) => "REAL",
            Self::Text(_) => "TEXT",
        }
    }
}

/// Writes cleaned frames into a SQLite table.
pub struct Loader {
    pool: SqlitePool,
    batch_size: usize,
    output_dir: PathBuf,
}

impl Loader {
    /// Connect to the destination store, creating the database file if
    /// needed, and probe the connection.
    pub async fn connect(
        database_url: &str,
        batch_size: usize,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(PipelineError::Storage)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Database connection successful: {}", database_url);

        Ok(Self {
            pool,
            batch_size,
            output_dir: output_dir.into(),
        })
    }

    /// Load all rows of the frame into `table` under the given write mode.
    ///
    /// Verifies the destination row count afterwards and writes a JSON load
    /// report. A connectivity or constraint error aborts the load.
    pub async fn load(
        &self,
        df: &DataFrame,
        table: &str,
        mode: WriteMode,
    ) -> Result<LoadOutcome> {
        if df.height() == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        validate_table_name(table)?;

        info!(
            "Starting load into table '{}' ({} rows, {} columns)",
            table,
            df.height(),
            df.width()
        );

        let columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let data: Vec<ColumnData> = df
            .get_columns()
            .iter()
            .map(|col| materialize_column(col.as_materialized_series()))
            .collect::<Result<_>>()?;

        let existed = self.table_exists(table).await?;
        let baseline = match mode {
            WriteMode::Fail if existed => {
                return Err(PipelineError::Storage(sqlx::Error::Protocol(format!(
                    "table '{table}' already exists and write mode is Fail"
                ))));
            }
            WriteMode::Replace => {
                if existed {
                    sqlx::query(&format!("DROP TABLE IF EXISTS \"{table}\""))
                        .execute(&self.pool)
                        .await?;
                    debug!("Dropped existing table '{}'", table);
                }
                0
            }
            WriteMode::Append if existed => self.count_rows(table).await?,
            _ => 0,
        };

        let create_sql = create_table_sql(table, &columns, &data);
        sqlx::query(&create_sql).execute(&self.pool).await?;

        self.insert_batches(df.height(), table, &columns, &data)
            .await?;

        // Verify by counting what actually landed.
        let total = self.count_rows(table).await?;
        let loaded = total - baseline;
        if loaded != df.height() {
            return Err(PipelineError::LoadVerification {
                expected: df.height(),
                actual: loaded,
            });
        }

        let success_ratio = (loaded as f64 / df.height() as f64) * 100.0;
        info!(
            "Successfully loaded {} rows into table '{}' ({:.1}%)",
            loaded, table, success_ratio
        );

        let report_path = self.write_load_report(df, table, loaded)?;

        Ok(LoadOutcome {
            table: table.to_string(),
            source_rows: df.height(),
            loaded_rows: loaded,
            success_ratio,
            report_path,
        })
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn count_rows(&self, table: &str) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{table}\""))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn insert_batches(
        &self,
        height: usize,
        table: &str,
        columns: &[String],
        data: &[ColumnData],
    ) -> Result<()> {
        // Bound rows per statement by both the configured batch size and
        // SQLite's bind-variable limit.
        let rows_per_batch = self
            .batch_size
            .min(MAX_BIND_VARIABLES / columns.len().max(1))
            .max(1);

        let quoted: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
        let insert_head = format!("INSERT INTO \"{table}\" ({}) ", quoted.join(", "));

        info!(
            "Loading {} rows in batches of {}",
            height, rows_per_batch
        );

        let mut offset = 0;
        while offset < height {
            let end = (offset + rows_per_batch).min(height);
            let mut tx = self.pool.begin().await?;

            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(insert_head.as_str());
            builder.push_values(offset..end, |mut row, idx| {
                for col in data {
                    match col {
                        ColumnData::Int(values) => row.push_bind(values[idx]),
                        ColumnData::Float(values) => row.push_bind(values[idx]),
                        ColumnData::Bool(values) => row.push_bind(values[idx]),
                        ColumnData::Text(values) => row.push_bind(values[idx].clone()),
                    };
                }
            });

            builder.build().execute(&mut *tx).await?;
            tx.commit().await?;

            debug!("Inserted rows {}..{}", offset, end);
            offset = end;
        }

        Ok(())
    }

    /// Write the JSON load report to the output directory.
    fn write_load_report(
        &self,
        df: &DataFrame,
        table: &str,
        loaded_rows: usize,
    ) -> Result<Option<PathBuf>> {
        let quality = QualityReport::from_frame(df)?;
        let success_ratio = if df.height() > 0 {
            (loaded_rows as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        let report = json!({
            "timestamp": Local::now().to_rfc3339(),
            "table_name": table,
            "source_rows": df.height(),
            "loaded_rows": loaded_rows,
            "load_success_rate": success_ratio,
            "columns_loaded": df.get_column_names().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            "data_types": quality.data_types,
            "data_quality": quality,
        });

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!(
            "load_report_{}_{}.json",
            table,
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!("Load report saved: {}", path.display());

        Ok(Some(path))
    }

    /// Close the pool. Dropping the loader also releases the connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Reject table names that are not plain identifiers.
fn validate_table_name(table: &str) -> Result<()> {
    if table.is_empty()
        || !table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(PipelineError::InvalidConfig(format!(
            "invalid table name '{table}'"
        )));
    }
    Ok(())
}

/// Materialize a series into bindable cells, converting non-finite floats
/// to explicit nulls on the way.
fn materialize_column(series: &Series) -> Result<ColumnData> {
    let dtype = series.dtype();
    let is_integer = matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    );
    if dtype == &DataType::Boolean {
        Ok(ColumnData::Bool(series.bool()?.into_iter().collect()))
    } else if is_integer {
        let casted = series.cast(&DataType::Int64)?;
        Ok(ColumnData::Int(casted.i64()?.into_iter().collect()))
    } else if is_numeric_dtype(dtype) {
        let casted = series.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|f| f.is_finite()))
            .collect();
        Ok(ColumnData::Float(values))
    } else {
        let casted = series.cast(&DataType::String)?;
        let values = casted
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(ColumnData::Text(values))
    }
}

fn create_table_sql(table: &str, columns: &[String], data: &[ColumnData]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .zip(data)
        .map(|(name, col)| format!("\"{name}\" {}", col.sql_type()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" ({})",
        defs.join(", ")
    )
}
