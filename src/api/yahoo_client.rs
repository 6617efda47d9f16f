//! Yahoo Finance chart API client.
//!
//! Pulls bars from the v8 chart endpoint using the same `range`/`interval` strings
//! the provider documents (`1y`, `1d`, ...). Timestamps are converted into the
//! exchange's local time using the `exchangeTimezoneName` reported in the response
//! metadata, so each bar gets the offset in force on its own date, and stored
//! timezone-naive.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::MarketDataProvider;
use crate::error::FetchError;
use crate::models::{Interval, Period, PriceObservation, ProviderSettings, Symbol, TimeSeries};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

/// Yahoo Finance API client
pub struct YahooClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl YahooClient {
    /// Create a client from the configured provider settings
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Self::with_base_url(&settings.base_url, settings.fetch_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("provider base url cannot carry a path: {}", base_url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)")
            .build()?;

        Ok(Self { client, base_url, timeout })
    }

    fn chart_url(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidResponse {
                symbol: symbol.to_string(),
                message: format!("base url {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol.as_str()]);

        url.query_pairs_mut()
            .append_pair("range", period.as_str())
            .append_pair("interval", interval.as_str())
            .append_pair("includePrePost", "false")
            .append_pair("events", "div,splits");

        Ok(url)
    }

    fn request_error(&self, symbol: &Symbol, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout { symbol: symbol.to_string(), timeout: self.timeout }
        } else if error.is_decode() {
            FetchError::InvalidResponse { symbol: symbol.to_string(), message: error.to_string() }
        } else {
            FetchError::Unreachable { symbol: symbol.to_string(), message: error.to_string() }
        }
    }

    /// Turn a decoded chart response into a series for `symbol`.
    fn parse_chart(
        symbol: &Symbol,
        interval: Interval,
        response: ChartResponse,
    ) -> Result<TimeSeries, FetchError> {
        let invalid = |message: &str| FetchError::InvalidResponse {
            symbol: symbol.to_string(),
            message: message.to_string(),
        };

        if let Some(err) = response.chart.error {
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Err(FetchError::UnknownSymbol(symbol.to_string()));
            }
            return Err(invalid(&format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }

        let data = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))?;

        let clock = data.meta.map(ExchangeClock::from_meta).unwrap_or(ExchangeClock::Fixed(0));
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut observations = Vec::with_capacity(data.timestamp.len());
        for (i, &ts) in data.timestamp.iter().enumerate() {
            // Bars without a close are holidays or still-forming candles
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };

            let timestamp = clock
                .local_timestamp(ts, interval)
                .ok_or_else(|| invalid(&format!("invalid timestamp: {}", ts)))?;

            observations.push(PriceObservation {
                timestamp,
                symbol: symbol.clone(),
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close,
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        if observations.is_empty() {
            return Err(FetchError::EmptySeries(symbol.to_string()));
        }

        Ok(TimeSeries::new(symbol.clone(), observations))
    }
}

/// How bar timestamps are turned into exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExchangeClock {
    /// Named exchange zone; the offset is resolved per bar.
    Zone(Tz),
    /// `gmtoffset` only, which is the offset at fetch time.
    Fixed(i64),
}

impl ExchangeClock {
    fn from_meta(meta: ChartMeta) -> Self {
        match meta.exchange_timezone_name.as_deref().map(str::parse::<Tz>) {
            Some(Ok(tz)) => ExchangeClock::Zone(tz),
            Some(Err(_)) => {
                warn!(
                    "Unknown exchange timezone {:?}, using fixed offset {}s",
                    meta.exchange_timezone_name, meta.gmtoffset
                );
                ExchangeClock::Fixed(meta.gmtoffset)
            }
            None => ExchangeClock::Fixed(meta.gmtoffset),
        }
    }

    /// Exchange-local, timezone-naive time of a bar; daily and coarser bars land on midnight.
    fn local_timestamp(&self, ts: i64, interval: Interval) -> Option<NaiveDateTime> {
        let utc = DateTime::from_timestamp(ts, 0)?;
        let local = match self {
            ExchangeClock::Zone(tz) => utc.with_timezone(tz).naive_local(),
            ExchangeClock::Fixed(offset) => {
                utc.naive_utc().checked_add_signed(ChronoDuration::seconds(*offset))?
            }
        };

        if interval.is_intraday() {
            return Some(local);
        }

        let day = match self {
            ExchangeClock::Zone(_) => local.date(),
            // A bar from the other side of a DST change is off by up to an hour
            ExchangeClock::Fixed(_) => local.checked_add_signed(ChronoDuration::hours(1))?.date(),
        };
        day.and_hms_opt(0, 0, 0)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<TimeSeries, FetchError> {
        let url = self.chart_url(symbol, period, interval)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(symbol, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::UnknownSymbol(symbol.to_string()));
        }
        if !status.is_success() {
            warn!("Provider returned HTTP {} for {}", status, symbol);
            return Err(FetchError::Http { symbol: symbol.to_string(), status: status.as_u16() });
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(symbol, e))?;

        let series = Self::parse_chart(symbol, interval, chart)?;
        debug!("Fetched {} observations for {}", series.len(), symbol);
        Ok(series)
    }
}
