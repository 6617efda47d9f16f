//! Relational sink for the commodity price table.
//!
//! Both backends share one table contract: `Date`, `Symbol`, `Open`, `High`,
//! `Low`, `Close`, `Volume`, with an index on `Date`. A load always replaces the
//! whole table inside a single transaction.

use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::error::LoadError;
use crate::models::{PriceObservation, SinkConfig};

/// Implements [`PriceSink`] for a pool-backed sink.
///
/// The backends run the same statements and differ only in the sqlx database
/// type, the column types and how the table name is qualified.
macro_rules! impl_pool_sink {
    ($sink:ty, $db:ty, $backend:literal, $types:expr, $qualify:path, $decode:path) => {
        #[async_trait::async_trait]
        impl $crate::database::PriceSink for $sink {
            fn backend(&self) -> &'static str {
                $backend
            }

            async fn replace_table(
                &self,
                target: &$crate::database::TableRef,
                rows: &[$crate::models::PriceObservation],
            ) -> Result<u64, $crate::error::LoadError> {
                let qualified = $qualify(target);
                let write_err = |source: sqlx::Error| $crate::error::LoadError::Write {
                    table: target.to_string(),
                    source,
                };

                let mut tx = self.pool.begin().await.map_err(write_err)?;

                let setup = [
                    $crate::database::drop_table_sql(&qualified),
                    $crate::database::create_table_sql(&qualified, &$types),
                ];
                for sql in setup.iter() {
                    sqlx::query(sql).execute(&mut tx).await.map_err(write_err)?;
                }

                for chunk in rows.chunks($crate::database::INSERT_CHUNK_ROWS) {
                    let mut builder: sqlx::QueryBuilder<$db> =
                        sqlx::QueryBuilder::new($crate::database::insert_prefix(&qualified));
                    builder.push_values(chunk, |mut b, row| {
                        b.push_bind(row.timestamp)
                            .push_bind(row.symbol.as_str())
                            .push_bind(row.open)
                            .push_bind(row.high)
                            .push_bind(row.low)
                            .push_bind(row.close)
                            .push_bind(row.volume);
                    });
                    builder.build().execute(&mut tx).await.map_err(write_err)?;
                    tracing::debug!("Inserted {} rows into {}", chunk.len(), target);
                }

                sqlx::query(&$crate::database::create_index_sql(target, &qualified))
                    .execute(&mut tx)
                    .await
                    .map_err(write_err)?;

                tx.commit().await.map_err(write_err)?;
                Ok(rows.len() as u64)
            }

            async fn read_table(
                &self,
                target: &$crate::database::TableRef,
            ) -> Result<Vec<$crate::models::PriceObservation>, $crate::error::LoadError> {
                let read_err = |source: sqlx::Error| $crate::error::LoadError::Read {
                    table: target.to_string(),
                    source,
                };

                let rows = sqlx::query(&$crate::database::select_all_sql(&$qualify(target)))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(read_err)?;

                rows.iter().map(|row| $decode(row).map_err(read_err)).collect()
            }
        }
    };
}

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresSink;
pub use sqlite::SqliteSink;

/// Canonical destination table.
pub const TABLE_NAME: &str = "commodities";

/// Rows per multi-row INSERT, kept under SQLite's bind parameter limit.
pub const INSERT_CHUNK_ROWS: usize = 100;

const COLUMNS: &str = r#"("Date", "Symbol", "Open", "High", "Low", "Close", "Volume")"#;

/// Schema-qualified destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: String,
    table: String,
}

impl TableRef {
    /// The canonical table inside `schema`.
    pub fn new(schema: &str) -> Result<Self, LoadError> {
        Self::with_table(schema, TABLE_NAME)
    }

    pub fn with_table(schema: &str, table: &str) -> Result<Self, LoadError> {
        for name in [schema, table] {
            if !is_identifier(name) {
                return Err(LoadError::InvalidIdentifier(name.to_string()));
            }
        }
        Ok(Self { schema: schema.to_string(), table: table.to_string() })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn index_name(&self) -> String {
        format!("ix_{}_Date", self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Backend-specific column types for the price table.
pub(crate) struct ColumnTypes {
    pub timestamp: &'static str,
    pub text: &'static str,
    pub float: &'static str,
    pub integer: &'static str,
}

pub(crate) fn create_table_sql(qualified: &str, types: &ColumnTypes) -> String {
    format!(
        r#"CREATE TABLE {qualified} (
            "Date" {ts} NOT NULL,
            "Symbol" {text} NOT NULL,
            "Open" {float},
            "High" {float},
            "Low" {float},
            "Close" {float} NOT NULL,
            "Volume" {int}
        )"#,
        qualified = qualified,
        ts = types.timestamp,
        text = types.text,
        float = types.float,
        int = types.integer,
    )
}

pub(crate) fn drop_table_sql(qualified: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", qualified)
}

pub(crate) fn create_index_sql(target: &TableRef, qualified: &str) -> String {
    format!(r#"CREATE INDEX "{}" ON {} ("Date")"#, target.index_name(), qualified)
}

pub(crate) fn insert_prefix(qualified: &str) -> String {
    format!("INSERT INTO {} {} ", qualified, COLUMNS)
}

pub(crate) fn select_all_sql(qualified: &str) -> String {
    format!(
        concat!(
            r#"SELECT "Date", "Symbol", "Open", "High", "Low", "Close", "Volume" "#,
            r#"FROM {} ORDER BY "Symbol", "Date""#,
        ),
        qualified
    )
}

/// A relational destination able to replace and read back the price table.
#[async_trait::async_trait]
pub trait PriceSink: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Drop and recreate `target` with exactly `rows`, atomically.
    async fn replace_table(
        &self,
        target: &TableRef,
        rows: &[PriceObservation],
    ) -> Result<u64, LoadError>;

    /// Every row of `target`, ordered by symbol then timestamp.
    async fn read_table(&self, target: &TableRef) -> Result<Vec<PriceObservation>, LoadError>;
}

/// Open the sink described by the configuration.
pub async fn connect(config: &SinkConfig) -> Result<Arc<dyn PriceSink>, LoadError> {
    let sink: Arc<dyn PriceSink> = match config {
        SinkConfig::Postgres(pg) => Arc::new(PostgresSink::connect(pg).await?),
        SinkConfig::Sqlite { path } => Arc::new(SqliteSink::connect(path).await?),
    };
    info!("💾 Connected to {} sink", sink.backend());
    Ok(sink)
}
