//! Close-price summaries over a concatenated dataset

use pretty_assertions::assert_eq;

use crate::common::test_data::{create_test_series, day, symbol};
use commodities_etl::analysis::{format_report, summarize, ReportFilter};
use commodities_etl::models::Dataset;

fn sample() -> Dataset {
    Dataset::concat(vec![
        create_test_series("CL=F", &[70.0, 74.0, 72.0]),
        create_test_series("GC=F", &[2000.0, 2010.0]),
    ])
}

#[test]
fn test_summary_per_symbol() {
    let summaries = summarize(sample().rows(), &ReportFilter::default());
    assert_eq!(summaries.len(), 2);

    let crude = &summaries[0];
    assert_eq!(crude.symbol, symbol("CL=F"));
    assert_eq!(crude.observations, 3);
    assert_eq!(crude.max_close, 74.0);
    assert_eq!(crude.min_close, 70.0);
    assert_eq!(crude.mean_close, 72.0);
    assert_eq!(crude.last_close, 72.0);
    assert_eq!(crude.first, day(1));
    assert_eq!(crude.last, day(3));
}

#[test]
fn test_filter_by_symbol_and_dates() {
    let filter = ReportFilter {
        symbol: Some(symbol("CL=F")),
        from: Some(day(2).date()),
        to: Some(day(3).date()),
    };
    let summaries = summarize(sample().rows(), &filter);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].observations, 2);
    assert_eq!(summaries[0].mean_close, 73.0);
}

#[test]
fn test_report_lists_every_symbol() {
    let report = format_report(&summarize(sample().rows(), &ReportFilter::default()));
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Symbol"));
    assert!(lines[1].starts_with("CL=F"));
    assert!(lines[2].contains("$2010.00"));
}
