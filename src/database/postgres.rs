use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Postgres, Row};
use std::time::Duration;
use tracing::info;

use super::{ColumnTypes, TableRef};
use crate::error::LoadError;
use crate::models::config::TlsMode;
use crate::models::{PostgresConfig, PriceObservation, Symbol};

const PG_TYPES: ColumnTypes = ColumnTypes {
    timestamp: "TIMESTAMP",
    text: "TEXT",
    float: "DOUBLE PRECISION",
    integer: "BIGINT",
};

/// Production sink: Postgres over TLS.
#[derive(Clone)]
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn connect(config: &PostgresConfig) -> Result<Self, LoadError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode(config.tls_mode));

        info!("Connecting to postgres at {}:{}/{}", config.host, config.port, config.database);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(LoadError::Connect)?;

        Ok(Self { pool })
    }
}

fn ssl_mode(mode: TlsMode) -> PgSslMode {
    match mode {
        TlsMode::Require => PgSslMode::Require,
        TlsMode::VerifyCa => PgSslMode::VerifyCa,
        TlsMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// `"schema"."table"`
fn qualified_name(target: &TableRef) -> String {
    format!(r#""{}"."{}""#, target.schema(), target.table())
}

fn decode_row(row: &PgRow) -> Result<PriceObservation, sqlx::Error> {
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

impl_pool_sink!(PostgresSink, Postgres, "postgres", PG_TYPES, qualified_name, decode_row);
