use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::{Interval, Period, Symbol};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// What to do when a single symbol cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run on the first fetch error; the sink is left untouched.
    #[default]
    FailFast,
    /// Log the failing symbol and load whatever was fetched.
    SkipFailed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "skip-failed" | "skip_failed" | "skip" => Ok(FailurePolicy::SkipFailed),
            other => Err(format!("unsupported failure policy '{}'", other)),
        }
    }
}

/// Encrypted transport levels accepted for the Postgres sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "require" => Ok(TlsMode::Require),
            "verify-ca" => Ok(TlsMode::VerifyCa),
            "verify-full" => Ok(TlsMode::VerifyFull),
            "disable" | "allow" | "prefer" => {
                Err(format!("sslmode '{}' is not allowed, the sink requires TLS", s.trim()))
            }
            other => Err(format!("unsupported sslmode '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub tls_mode: TlsMode,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("tls_mode", &self.tls_mode)
            .finish()
    }
}

/// Where the dataset is written.
#[derive(Debug, Clone)]
pub enum SinkConfig {
    Postgres(PostgresConfig),
    Sqlite { path: PathBuf },
}

/// Knobs for one ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub period: Period,
    pub interval: Interval,
    /// Total attempts per symbol, 1 means no retry
    pub fetch_attempts: u32,
    pub retry_delay: Duration,
    pub fetch_concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            period: Period::default(),
            interval: Interval::default(),
            fetch_attempts: 1,
            retry_delay: Duration::from_millis(2000),
            fetch_concurrency: 1,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Market data provider endpoint and per-request timeout
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub fetch_timeout: Duration,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub sink: SinkConfig,
    pub schema: String,
    pub symbols: Vec<Symbol>,
    pub pipeline: PipelineSettings,
    pub provider: ProviderSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Provider settings alone, for tools that never open the sink
    pub fn provider_from_env() -> Result<ProviderSettings> {
        dotenvy::dotenv().ok();

        Self::provider_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn provider_from_lookup<F>(lookup: F) -> Result<ProviderSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        Ok(ProviderSettings {
            base_url: get("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            fetch_timeout: Duration::from_secs(parse_or(
                get("FETCH_TIMEOUT_SECS"),
                30u64,
                "FETCH_TIMEOUT_SECS",
            )?),
        })
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let required =
            |key: &str| get(key).ok_or_else(|| anyhow!("{} environment variable required", key));

        let sink = match get("SQLITE_PATH") {
            Some(path) => SinkConfig::Sqlite { path: PathBuf::from(path) },
            None => SinkConfig::Postgres(PostgresConfig {
                host: required("DB_HOST")?,
                port: parse_or(get("DB_PORT"), 5432, "DB_PORT")?,
                database: required("DB_NAME")?,
                user: required("DB_USER")?,
                password: required("DB_PASS")?,
                tls_mode: match get("DB_SSLMODE") {
                    Some(mode) => mode
                        .parse::<TlsMode>()
                        .map_err(|e| anyhow!("invalid value for DB_SSLMODE: {}", e))?,
                    None => TlsMode::default(),
                },
            }),
        };

        let symbols = match get("COMMODITY_SYMBOLS") {
            Some(list) => {
                let symbols = Symbol::parse_list(&list);
                // A set but unusable list would replace the table with nothing
                if symbols.is_empty() {
                    return Err(anyhow!("COMMODITY_SYMBOLS names no symbol: '{}'", list));
                }
                symbols
            }
            None => Symbol::defaults(),
        };

        let pipeline = PipelineSettings {
            period: parse_str_or(get("FETCH_PERIOD"), Period::default(), "FETCH_PERIOD")?,
            interval: parse_str_or(get("FETCH_INTERVAL"), Interval::default(), "FETCH_INTERVAL")?,
            fetch_attempts: parse_or(get("FETCH_ATTEMPTS"), 1u32, "FETCH_ATTEMPTS")?.max(1),
            retry_delay: Duration::from_millis(parse_or(
                get("FETCH_RETRY_DELAY_MS"),
                2000u64,
                "FETCH_RETRY_DELAY_MS",
            )?),
            fetch_concurrency: parse_or(get("FETCH_CONCURRENCY"), 1usize, "FETCH_CONCURRENCY")?
                .max(1),
            failure_policy: parse_str_or(
                get("FAILURE_POLICY"),
                FailurePolicy::default(),
                "FAILURE_POLICY",
            )?,
        };

        Ok(Config {
            sink,
            schema: get("DB_SCHEMA").unwrap_or_else(|| "public".to_string()),
            symbols,
            pipeline,
            provider: Self::provider_from_lookup(&lookup)?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T>(value: Option<String>, default: T, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse::<T>().with_context(|| format!("invalid value for {}: '{}'", key, v)),
        None => Ok(default),
    }
}

fn parse_str_or<T>(value: Option<String>, default: T, key: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    match value {
        Some(v) => v.parse::<T>().map_err(|e| anyhow!("invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}
