//! Common test utilities and helpers

pub mod api_mock;
pub mod database;

pub use api_mock::FakeProvider;
pub use database::TestSink;

/// Test data utilities
pub mod test_data {
    use chrono::{NaiveDate, NaiveDateTime};
    use commodities_etl::models::{PriceObservation, Symbol, TimeSeries};

    pub fn symbol(name: &str) -> Symbol {
        Symbol::new(name).unwrap()
    }

    pub fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|n| symbol(n)).collect()
    }

    /// Midnight of the given day in January 2024
    pub fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    /// Create a test observation with an OHLC bar around `close`
    pub fn create_test_observation(name: &str, d: u32, close: f64) -> PriceObservation {
        PriceObservation {
            timestamp: day(d),
            symbol: symbol(name),
            open: Some(close - 0.5),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close,
            volume: Some(100_000),
        }
    }

    /// Daily series starting on January 1st with the given closes
    pub fn create_test_series(name: &str, closes: &[f64]) -> TimeSeries {
        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| create_test_observation(name, i as u32 + 1, close))
            .collect();
        TimeSeries::new(symbol(name), observations)
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("commodities_etl=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
