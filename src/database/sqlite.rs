use chrono::NaiveDateTime;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::{ColumnTypes, TableRef};
use crate::error::LoadError;
use crate::models::{PriceObservation, Symbol};

const SQLITE_TYPES: ColumnTypes = ColumnTypes {
    timestamp: "DATETIME",
    text: "TEXT",
    float: "REAL",
    integer: "INTEGER",
};

/// File-backed sink for local runs and tests.
///
/// SQLite has a single schema per file, so the schema part of a [`TableRef`] is
/// validated but not used to qualify the table.
#[derive(Clone)]
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub async fn connect(path: &Path) -> Result<Self, LoadError> {
        info!("Opening sqlite sink at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(LoadError::Connect)?;

        Ok(Self { pool })
    }
}

fn qualified_name(target: &TableRef) -> String {
    format!(r#""{}""#, target.table())
}

fn decode_row(row: &SqliteRow) -> Result<PriceObservation, sqlx::Error> {
    let symbol: String = row.try_get("Symbol")?;
    Ok(PriceObservation {
        timestamp: row.try_get::<NaiveDateTime, _>("Date")?,
        symbol: Symbol::new(symbol).map_err(|e| sqlx::Error::Decode(e.into()))?,
        open: row.try_get("Open")?,
        high: row.try_get("High")?,
        low: row.try_get("Low")?,
        close: row.try_get("Close")?,
        volume: row.try_get("Volume")?,
    })
}

impl_pool_sink!(SqliteSink, Sqlite, "sqlite", SQLITE_TYPES, qualified_name, decode_row);
