//! Bar: the normalized market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily (or weekly/monthly) OHLCV bar as emitted to the frontend.
///
/// Prices that the provider left blank or non-numeric are `0.0`; a missing
/// volume is `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

/// One intraday point from the minute series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickPoint {
    /// `HH:MM`, or the raw provider label if it could not be parsed.
    pub time: String,
    pub price: f64,
    pub volume: u64,
}
