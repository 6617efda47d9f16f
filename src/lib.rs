pub mod analysis;
pub mod api;
pub mod database;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;

pub use error::{FetchError, LoadError, PipelineError};
pub use loader::{BatchLoader, RowCount};
pub use pipeline::IngestionPipeline;

/// Install the fmt subscriber used by the binaries.
///
/// `RUST_LOG` overrides the default `commodities_etl=info` filter.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("commodities_etl=info,fetch_series=info")
        });

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging was already initialized");
    }
}
