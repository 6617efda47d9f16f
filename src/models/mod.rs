use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod config;
pub use config::{
    Config, FailurePolicy, PipelineSettings, PostgresConfig, ProviderSettings, SinkConfig,
};

/// Instruments loaded when no symbol list is configured: crude oil, silver, gold futures.
pub const DEFAULT_SYMBOLS: [&str; 3] = ["CL=F", "SI=F", "GC=F"];

/// Identifier of one tradable commodity instrument, e.g. `CL=F`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        Ok(Symbol(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma separated list, ignoring blank entries.
    pub fn parse_list(list: &str) -> Vec<Symbol> {
        list.split(',').filter_map(|s| Symbol::new(s).ok()).collect()
    }

    pub fn defaults() -> Vec<Symbol> {
        DEFAULT_SYMBOLS.iter().map(|s| Symbol(s.to_string())).collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Lookback window understood by the chart provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "5d" => Ok(Period::FiveDays),
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "ytd" => Ok(Period::YearToDate),
            "max" => Ok(Period::Max),
            other => Err(format!("unsupported period '{}'", other)),
        }
    }
}

/// Sampling granularity understood by the chart provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
    NinetyMinutes,
    OneHour,
    #[default]
    OneDay,
    FiveDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    /// True for sub-daily bars, whose timestamps keep their time of day.
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::OneMinute
                | Interval::TwoMinutes
                | Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::SixtyMinutes
                | Interval::NinetyMinutes
                | Interval::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "2m" => Ok(Interval::TwoMinutes),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "60m" => Ok(Interval::SixtyMinutes),
            "90m" => Ok(Interval::NinetyMinutes),
            "1h" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            "5d" => Ok(Interval::FiveDays),
            "1wk" => Ok(Interval::OneWeek),
            "1mo" => Ok(Interval::OneMonth),
            "3mo" => Ok(Interval::ThreeMonths),
            other => Err(format!("unsupported interval '{}'", other)),
        }
    }
}

/// One row of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Exchange-local, timezone-naive bar time
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<i64>,
}

/// Observations for a single symbol, ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    symbol: Symbol,
    observations: Vec<PriceObservation>,
}

impl TimeSeries {
    /// Build a series, retagging every row with `symbol` and sorting by timestamp.
    pub fn new(symbol: Symbol, mut observations: Vec<PriceObservation>) -> Self {
        for observation in observations.iter_mut() {
            if observation.symbol != symbol {
                observation.symbol = symbol.clone();
            }
        }
        observations.sort_by_key(|o| o.timestamp);
        Self { symbol, observations }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn into_observations(self) -> Vec<PriceObservation> {
        self.observations
    }
}

/// Every fetched series of one pipeline run, concatenated in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<PriceObservation>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concat(series: impl IntoIterator<Item = TimeSeries>) -> Self {
        let mut dataset = Dataset::new();
        for s in series {
            dataset.push_series(s);
        }
        dataset
    }

    pub fn push_series(&mut self, series: TimeSeries) {
        self.rows.extend(series.into_observations());
    }

    pub fn rows(&self) -> &[PriceObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct symbols in first-seen order
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut seen: Vec<&Symbol> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&&row.symbol) {
                seen.push(&row.symbol);
            }
        }
        seen
    }

    pub fn rows_for<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> impl Iterator<Item = &'a PriceObservation> + 'a {
        self.rows.iter().filter(move |row| &row.symbol == symbol)
    }
}
