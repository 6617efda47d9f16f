//! Replace-on-write loader for the concatenated dataset.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::database::{PriceSink, TableRef};
use crate::error::LoadError;
use crate::models::{Dataset, PriceObservation};

/// Number of rows written by one load.
pub type RowCount = u64;

/// Writes a [`Dataset`] to `<schema>.commodities`, replacing its prior contents.
#[derive(Clone)]
pub struct BatchLoader {
    sink: Arc<dyn PriceSink>,
    target: TableRef,
}

impl BatchLoader {
    pub fn new(sink: Arc<dyn PriceSink>, schema: &str) -> Result<Self, LoadError> {
        Ok(Self { sink, target: TableRef::new(schema)? })
    }

    pub fn target(&self) -> &TableRef {
        &self.target
    }

    /// Replace the destination table with `dataset`.
    ///
    /// An empty dataset leaves an existing, empty table behind. On error the
    /// transaction is rolled back and the previous contents survive.
    pub async fn load(&self, dataset: &Dataset) -> Result<RowCount, LoadError> {
        let started = Instant::now();
        info!(
            "📥 Loading {} rows for {} symbols into {} ({})",
            dataset.len(),
            dataset.symbols().len(),
            self.target,
            self.sink.backend()
        );

        match self.sink.replace_table(&self.target, dataset.rows()).await {
            Ok(written) => {
                info!(
                    "✅ Replaced {} with {} rows in {:?}",
                    self.target,
                    written,
                    started.elapsed()
                );
                Ok(written)
            }
            Err(e) => {
                error!("❌ Load into {} failed, previous contents kept: {}", self.target, e);
                Err(e)
            }
        }
    }

    /// Every row currently stored in the destination table.
    pub async fn read_back(&self) -> Result<Vec<PriceObservation>, LoadError> {
        self.sink.read_table(&self.target).await
    }
}
