//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over the upstream market-data source so
//! the services can be exercised against a scripted provider in tests.
//! History and minute queries return the provider's own tabular shape
//! (column labels included); reconciling those shapes is the normalizer's job.

use crate::domain::IndexInfo;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for provider and normalization failures.
///
/// Every variant ends up as the `error` message of a failed reply.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("unsupported index code: {code}")]
    UnsupportedIndex { code: String },

    #[error("frame error: {0}")]
    Frame(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Bar aggregation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Period::Daily),
            "weekly" | "week" | "w" => Ok(Period::Weekly),
            "monthly" | "month" | "m" => Ok(Period::Monthly),
            other => Err(DataError::Other(format!(
                "unsupported period '{other}' (expected daily, weekly or monthly)"
            ))),
        }
    }
}

/// Inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days between start and end.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Raw snapshot from the provider, already descaled to plain units.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotQuote {
    pub code: String,
    pub name: Option<String>,
    pub last: Option<f64>,
    pub change_percent: Option<f64>,
    pub change_amount: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub prev_close: Option<f64>,
    pub volume: Option<u64>,
    pub turnover: Option<f64>,
}

/// Trait for upstream quote providers.
///
/// Implementations make exactly one request per call; there is no retry
/// policy. The cache layer sits above this trait.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Historical bars for a stock, in the provider's column labels.
    fn stock_history(
        &self,
        code: &str,
        range: DateRange,
        period: Period,
    ) -> Result<DataFrame, DataError>;

    /// Historical bars for an index, in the provider's column labels.
    ///
    /// May return rows outside `range`; callers filter.
    fn index_history(
        &self,
        index: &IndexInfo,
        range: DateRange,
        period: Period,
    ) -> Result<DataFrame, DataError>;

    /// Latest snapshot for a stock, `None` if the provider has no such code.
    fn stock_spot(&self, code: &str) -> Result<Option<SpotQuote>, DataError>;

    /// Latest snapshot for an index.
    fn index_spot(&self, index: &IndexInfo) -> Result<Option<SpotQuote>, DataError>;

    /// Today's one-minute bars for a stock, in the provider's column labels.
    fn minute_bars(&self, code: &str) -> Result<DataFrame, DataError>;
}
