//! Replies for the realtime verbs (quote, index quote, ticks, market).
//!
//! These keep the snake_case field names the frontend already reads.

use super::bar::TickPoint;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Whether the exchanges are in a continuous trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Trading,
    Closed,
}

impl MarketStatus {
    /// Session status at a local wall-clock time.
    ///
    /// Sessions are 09:30–11:30 and 13:00–15:00 on weekdays, both ends
    /// inclusive. Exchange holidays are not modelled.
    pub fn at(now: NaiveDateTime) -> Self {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketStatus::Closed;
        }
        let t = now.time();
        let in_session = |open: (u32, u32), close: (u32, u32)| {
            let open = NaiveTime::from_hms_opt(open.0, open.1, 0).unwrap_or(NaiveTime::MIN);
            let close = NaiveTime::from_hms_opt(close.0, close.1, 0).unwrap_or(NaiveTime::MIN);
            open <= t && t <= close
        };
        if in_session((9, 30), (11, 30)) || in_session((13, 0), (15, 0)) {
            MarketStatus::Trading
        } else {
            MarketStatus::Closed
        }
    }
}

/// `update_time` stamp: `YYYY-MM-DD HH:MM:SS`.
pub fn update_stamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Snapshot fields for a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSpot {
    pub current_price: f64,
    pub change_percent: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub turnover: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub yesterday_close: f64,
}

/// Snapshot fields for an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpot {
    pub current: f64,
    pub change_percent: f64,
    pub change_amount: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub yesterday_close: f64,
    pub volume: u64,
    pub turnover: f64,
}

/// Reply for `realtime` and `index_realtime`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReply<Q> {
    pub success: bool,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub quote: Option<Q>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub update_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_status: Option<MarketStatus>,
}

impl<Q> QuoteReply<Q> {
    pub fn ok(code: &str, name: String, quote: Q, now: NaiveDateTime) -> Self {
        Self {
            success: true,
            code: code.to_string(),
            name: Some(name),
            quote: Some(quote),
            error: None,
            update_time: update_stamp(now),
            market_status: Some(MarketStatus::at(now)),
        }
    }

    pub fn failed(code: &str, message: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            name: None,
            quote: None,
            error: Some(message.into()),
            update_time: update_stamp(now),
            market_status: None,
        }
    }
}

/// Reply for `tick`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReply {
    pub success: bool,
    pub code: String,
    pub data: Vec<TickPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub update_time: String,
}

impl TickReply {
    pub fn ok(code: &str, data: Vec<TickPoint>, now: NaiveDateTime) -> Self {
        Self {
            success: true,
            code: code.to_string(),
            count: Some(data.len()),
            data,
            error: None,
            update_time: update_stamp(now),
        }
    }

    pub fn failed(code: &str, message: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            data: Vec::new(),
            count: None,
            error: Some(message.into()),
            update_time: update_stamp(now),
        }
    }
}

/// One row of the market overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndex {
    /// Exchange-prefixed code, e.g. `sh000001`.
    pub code: String,
    pub name: String,
    pub current: f64,
    pub change_percent: f64,
    pub change_amount: f64,
}

/// Reply for `market`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReply {
    pub success: bool,
    pub data: Vec<MarketIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub update_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_status: Option<MarketStatus>,
}

impl MarketReply {
    pub fn ok(data: Vec<MarketIndex>, now: NaiveDateTime) -> Self {
        Self {
            success: true,
            data,
            error: None,
            update_time: update_stamp(now),
            market_status: Some(MarketStatus::at(now)),
        }
    }
}

/// Reply for requests rejected before any service is called.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReply {
    pub success: bool,
    pub error: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}
