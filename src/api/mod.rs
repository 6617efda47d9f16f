use crate::error::FetchError;
use crate::models::{Interval, Period, Symbol, TimeSeries};

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Source of price series, one symbol per call.
///
/// Implementations perform a fresh round-trip on every call; nothing is cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<TimeSeries, FetchError>;
}
