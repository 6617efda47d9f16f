//! Test database utilities using the SQLite sink

use std::sync::Arc;
use tempfile::TempDir;

use commodities_etl::database::{PriceSink, SqliteSink, TableRef};
use commodities_etl::models::PriceObservation;
use commodities_etl::BatchLoader;

/// A fresh SQLite sink in its own temporary directory.
///
/// The directory lives as long as this value.
pub struct TestSink {
    _dir: TempDir,
    pub sink: Arc<SqliteSink>,
}

impl TestSink {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let sink = SqliteSink::connect(&dir.path().join("commodities.db"))
            .await
            .expect("Failed to open sqlite sink");
        Self { _dir: dir, sink: Arc::new(sink) }
    }

    pub fn loader(&self) -> BatchLoader {
        BatchLoader::new(self.sink.clone(), "public").expect("Failed to create loader")
    }

    /// Everything currently in the destination table
    pub async fn contents(&self) -> Vec<PriceObservation> {
        self.sink
            .read_table(&TableRef::new("public").unwrap())
            .await
            .expect("Failed to read destination table")
    }
}
