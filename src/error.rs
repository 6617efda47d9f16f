//! Error taxonomy for the fetch, load and pipeline stages.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a price series for one symbol.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider unreachable while fetching {symbol}: {message}")]
    Unreachable { symbol: String, message: String },

    #[error("fetch for {symbol} timed out after {timeout:?}")]
    Timeout { symbol: String, timeout: Duration },

    #[error("symbol not recognized by provider: {0}")]
    UnknownSymbol(String),

    #[error("provider returned no observations for {0}")]
    EmptySeries(String),

    #[error("provider returned HTTP {status} for {symbol}")]
    Http { symbol: String, status: u16 },

    #[error("unexpected provider response for {symbol}: {message}")]
    InvalidResponse { symbol: String, message: String },
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Unreachable { .. } | FetchError::Timeout { .. } => true,
            FetchError::Http { status, .. } => *status == 429 || *status >= 500,
            FetchError::UnknownSymbol(_)
            | FetchError::EmptySeries(_)
            | FetchError::InvalidResponse { .. } => false,
        }
    }
}

/// Failure to read from or replace the destination table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not connect to sink: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("write to {table} rejected: {source}")]
    Write {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("read from {table} failed: {source}")]
    Read {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Failure of an ingestion run, naming the stage (and symbol) that broke.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed for {symbol}: {source}")]
    Fetch {
        symbol: String,
        #[source]
        source: FetchError,
    },

    #[error("every requested symbol failed to fetch: {}", failed.join(", "))]
    AllFetchesFailed { failed: Vec<String> },

    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Fetch { .. } | PipelineError::AllFetchesFailed { .. } => "fetch",
            PipelineError::Load(_) => "load",
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            PipelineError::Fetch { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}
