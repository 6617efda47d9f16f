//! Per-symbol close-price summaries over the stored table.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write as _;

use crate::models::{PriceObservation, Symbol};

/// Which rows a report covers. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub symbol: Option<Symbol>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn matches(&self, row: &PriceObservation) -> bool {
        let date = row.timestamp.date();
        self.symbol.as_ref().map_or(true, |s| &row.symbol == s)
            && self.from.map_or(true, |from| date >= from)
            && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub symbol: Symbol,
    pub observations: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub max_close: f64,
    pub min_close: f64,
    pub mean_close: f64,
    pub last_close: f64,
}

/// One summary per symbol with matching rows, in first-seen order.
pub fn summarize(rows: &[PriceObservation], filter: &ReportFilter) -> Vec<PriceSummary> {
    let mut summaries: Vec<PriceSummary> = Vec::new();
    let mut totals: Vec<f64> = Vec::new();

    for row in rows.iter().filter(|r| filter.matches(r)) {
        match summaries.iter().position(|s| s.symbol == row.symbol) {
            Some(i) => {
                let s = &mut summaries[i];
                s.observations += 1;
                s.max_close = s.max_close.max(row.close);
                s.min_close = s.min_close.min(row.close);
                if row.timestamp < s.first {
                    s.first = row.timestamp;
                }
                if row.timestamp >= s.last {
                    s.last = row.timestamp;
                    s.last_close = row.close;
                }
                totals[i] += row.close;
            }
            None => {
                summaries.push(PriceSummary {
                    symbol: row.symbol.clone(),
                    observations: 1,
                    first: row.timestamp,
                    last: row.timestamp,
                    max_close: row.close,
                    min_close: row.close,
                    mean_close: row.close,
                    last_close: row.close,
                });
                totals.push(row.close);
            }
        }
    }

    for (summary, total) in summaries.iter_mut().zip(totals) {
        summary.mean_close = total / summary.observations as f64;
    }
    summaries
}

/// Plain-text table of summaries for the terminal.
pub fn format_report(summaries: &[PriceSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>6}  {:<10}  {:<10}  {:>10} {:>10} {:>10} {:>10}",
        "Symbol", "Rows", "From", "To", "Max", "Min", "Mean", "Last"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<10} {:>6}  {:<10}  {:<10}  {:>10} {:>10} {:>10} {:>10}",
            s.symbol.as_str(),
            s.observations,
            s.first.date(),
            s.last.date(),
            format!("${:.2}", s.max_close),
            format!("${:.2}", s.min_close),
            format!("${:.2}", s.mean_close),
            format!("${:.2}", s.last_close),
        );
    }
    out
}
