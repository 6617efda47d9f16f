//! Replace semantics of the SQLite sink through the batch loader

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::common::test_data::{create_test_observation, create_test_series, symbol};
use crate::common::{logging, TestSink};
use commodities_etl::database::{PriceSink, TableRef};
use commodities_etl::models::{Dataset, TimeSeries};
use commodities_etl::LoadError;

#[tokio::test]
async fn test_load_replaces_previous_contents() {
    logging::init_test_logging();

    let sink = TestSink::new().await;
    let loader = sink.loader();

    let first = Dataset::concat(vec![create_test_series("SI=F", &[23.0, 23.5, 24.0])]);
    assert_eq!(loader.load(&first).await.unwrap(), 3);

    let second = Dataset::concat(vec![create_test_series("GC=F", &[2050.0])]);
    assert_eq!(loader.load(&second).await.unwrap(), 1);

    let stored = loader.read_back().await.unwrap();
    assert_eq!(stored, second.rows().to_vec());
}

#[tokio::test]
async fn test_failed_load_keeps_previous_contents() {
    logging::init_test_logging();
    logging::log_test_step("Rejected row rolls back the whole replace");

    let sink = TestSink::new().await;
    let loader = sink.loader();

    let good = Dataset::concat(vec![create_test_series("CL=F", &[70.0, 71.0])]);
    loader.load(&good).await.unwrap();

    // SQLite stores NaN as NULL, which the Close column rejects
    let mut bad = Dataset::concat(vec![create_test_series("GC=F", &[2050.0, 2051.0])]);
    bad.push_series(TimeSeries::new(
        symbol("SI=F"),
        vec![create_test_observation("SI=F", 1, f64::NAN)],
    ));

    let result = loader.load(&bad).await;
    assert_matches!(result, Err(LoadError::Write { .. }));

    assert_eq!(sink.contents().await, good.rows().to_vec());
}

#[tokio::test]
async fn test_large_dataset_written_in_chunks() {
    logging::init_test_logging();

    let sink = TestSink::new().await;
    let closes: Vec<f64> = (0..250).map(|i| 50.0 + i as f64 * 0.1).collect();
    let rows: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let mut row = create_test_observation("CL=F", 1, close);
            row.timestamp += chrono::Duration::days(i as i64);
            row
        })
        .collect();
    let dataset = Dataset::concat(vec![TimeSeries::new(symbol("CL=F"), rows)]);

    assert_eq!(sink.loader().load(&dataset).await.unwrap(), 250);

    let stored = sink.contents().await;
    assert_eq!(stored.len(), 250);
    assert_eq!(stored.last().map(|r| r.close), closes.last().copied());
}

#[tokio::test]
async fn test_empty_dataset_leaves_empty_table() {
    logging::init_test_logging();

    let sink = TestSink::new().await;
    let loader = sink.loader();
    loader
        .load(&Dataset::concat(vec![create_test_series("CL=F", &[70.0])]))
        .await
        .unwrap();

    assert_eq!(loader.load(&Dataset::new()).await.unwrap(), 0);
    assert!(sink.contents().await.is_empty());
}

#[tokio::test]
async fn test_rejects_unsafe_schema_name() {
    assert_matches!(TableRef::new("public; DROP TABLE x"), Err(LoadError::InvalidIdentifier(_)));

    let sink = TestSink::new().await;
    assert_eq!(sink.sink.backend(), "sqlite");
}
