//! Row ordering of concatenated datasets

use pretty_assertions::assert_eq;

use crate::common::test_data::{create_test_observation, create_test_series, symbol};
use commodities_etl::models::{Dataset, TimeSeries};

#[test]
fn test_concat_keeps_input_symbol_order() {
    let dataset = Dataset::concat(vec![
        create_test_series("SI=F", &[23.1, 23.4]),
        create_test_series("CL=F", &[70.0]),
        create_test_series("GC=F", &[2050.0, 2061.5, 2049.0]),
    ]);

    let order: Vec<&str> = dataset.rows().iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["SI=F", "SI=F", "CL=F", "GC=F", "GC=F", "GC=F"]);

    let symbols: Vec<&str> = dataset.symbols().iter().map(|s| s.as_str()).collect();
    assert_eq!(symbols, vec!["SI=F", "CL=F", "GC=F"]);
}

#[test]
fn test_series_sorted_before_concat() {
    let unsorted = vec![
        create_test_observation("CL=F", 3, 72.0),
        create_test_observation("CL=F", 1, 70.0),
        create_test_observation("CL=F", 2, 71.0),
    ];
    let dataset = Dataset::concat(vec![TimeSeries::new(symbol("CL=F"), unsorted)]);

    let closes: Vec<f64> = dataset.rows().iter().map(|r| r.close).collect();
    assert_eq!(closes, vec![70.0, 71.0, 72.0]);
}

#[test]
fn test_rows_for_filters_by_symbol() {
    let dataset = Dataset::concat(vec![
        create_test_series("CL=F", &[70.0, 71.0]),
        create_test_series("GC=F", &[2050.0]),
    ]);

    let gold = symbol("GC=F");
    assert_eq!(dataset.rows_for(&gold).count(), 1);
    assert_eq!(dataset.len(), 3);
}
