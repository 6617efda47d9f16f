//! Scripted market data providers

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use commodities_etl::api::MarketDataProvider;
use commodities_etl::models::{Interval, Period, Symbol, TimeSeries};
use commodities_etl::FetchError;

enum Scripted {
    Series(TimeSeries),
    Unknown,
}

/// Provider answering from a fixed script, optionally after a per-symbol delay.
#[derive(Default)]
pub struct FakeProvider {
    responses: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: TimeSeries) -> Self {
        self.responses.insert(series.symbol().to_string(), Scripted::Series(series));
        self
    }

    /// Answer `symbol` with [`FetchError::UnknownSymbol`]
    pub fn with_unknown(mut self, symbol: &str) -> Self {
        self.responses.insert(symbol.to_string(), Scripted::Unknown);
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    /// Symbols requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn fetch(
        &self,
        symbol: &Symbol,
        _period: Period,
        _interval: Interval,
    ) -> Result<TimeSeries, FetchError> {
        self.calls.lock().unwrap().push(symbol.to_string());

        if let Some(delay) = self.delays.get(symbol.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(symbol.as_str()) {
            Some(Scripted::Series(series)) => Ok(series.clone()),
            Some(Scripted::Unknown) | None => Err(FetchError::UnknownSymbol(symbol.to_string())),
        }
    }
}

/// Chart API body as the provider returns it, one daily bar per close.
pub fn chart_body(start_ts: i64, closes: &[Option<f64>]) -> serde_json::Value {
    let timestamps: Vec<i64> = (0..closes.len() as i64).map(|i| start_ts + i * 86_400).collect();
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": { "gmtoffset": 0, "symbol": "CL=F" },
                "timestamp": timestamps,
                "indicators": { "quote": [{
                    "open": closes,
                    "high": closes,
                    "low": closes,
                    "close": closes,
                    "volume": closes.iter().map(|c| c.map(|_| 1000)).collect::<Vec<_>>()
                }]}
            }],
            "error": null
        }
    })
}
