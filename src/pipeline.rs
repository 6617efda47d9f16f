//! Fetch-then-replace ingestion run.
//!
//! One run fetches every configured symbol, concatenates the series in input
//! order and hands the whole dataset to the loader in a single call.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::api::MarketDataProvider;
use crate::error::{FetchError, PipelineError};
use crate::loader::{BatchLoader, RowCount};
use crate::models::{Dataset, FailurePolicy, PipelineSettings, Symbol, TimeSeries};

pub struct IngestionPipeline {
    provider: Arc<dyn MarketDataProvider>,
    loader: BatchLoader,
    settings: PipelineSettings,
}

impl IngestionPipeline {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        loader: BatchLoader,
        settings: PipelineSettings,
    ) -> Self {
        Self { provider, loader, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetch every symbol and replace the destination table with the result.
    pub async fn run(&self, symbols: &[Symbol]) -> Result<RowCount, PipelineError> {
        let started = Instant::now();
        info!(
            "🚀 Starting ingestion of {} symbols (period {}, interval {})",
            symbols.len(),
            self.settings.period,
            self.settings.interval
        );

        let dataset = self.fetch_all(symbols).await?;

        let written = self.loader.load(&dataset).await.map_err(|e| {
            error!("Pipeline failed at load stage: {}", e);
            PipelineError::from(e)
        })?;

        info!("🎉 Ingestion finished: {} rows in {:?}", written, started.elapsed());
        Ok(written)
    }

    /// Fetch every symbol into one dataset, ordered by input symbol then timestamp.
    pub async fn fetch_all(&self, symbols: &[Symbol]) -> Result<Dataset, PipelineError> {
        let concurrency = self.settings.fetch_concurrency.max(1);

        // `buffered` yields in input order regardless of completion order
        let mut results = stream::iter(symbols.iter().enumerate())
            .map(|(index, symbol)| async move {
                (index, symbol, self.fetch_with_retry(symbol).await)
            })
            .buffered(concurrency);

        let mut dataset = Dataset::new();
        let mut failed = Vec::new();

        while let Some((index, symbol, result)) = results.next().await {
            match result {
                Ok(series) => {
                    info!(
                        "✅ {}/{}: {} - {} observations",
                        index + 1,
                        symbols.len(),
                        symbol,
                        series.len()
                    );
                    dataset.push_series(series);
                }
                Err(e) => match self.settings.failure_policy {
                    FailurePolicy::FailFast => {
                        error!(
                            "❌ {}/{}: {} failed, aborting run - {}",
                            index + 1,
                            symbols.len(),
                            symbol,
                            e
                        );
                        return Err(PipelineError::Fetch { symbol: symbol.to_string(), source: e });
                    }
                    FailurePolicy::SkipFailed => {
                        warn!(
                            "⚠️ {}/{}: {} failed, skipping - {}",
                            index + 1,
                            symbols.len(),
                            symbol,
                            e
                        );
                        failed.push(symbol.to_string());
                    }
                },
            }
        }

        if !symbols.is_empty() && failed.len() == symbols.len() {
            error!("❌ Every symbol failed to fetch, sink left untouched");
            return Err(PipelineError::AllFetchesFailed { failed });
        }

        if !failed.is_empty() {
            warn!("Skipped {} of {} symbols: {}", failed.len(), symbols.len(), failed.join(", "));
        }

        Ok(dataset)
    }

    /// Fetch one symbol, retrying transient failures up to the configured attempt count.
    async fn fetch_with_retry(&self, symbol: &Symbol) -> Result<TimeSeries, FetchError> {
        let attempts = self.settings.fetch_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.provider.fetch(symbol, self.settings.period, self.settings.interval).await {
                Ok(series) => return Ok(series),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying...",
                        attempt, attempts, symbol, e
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
