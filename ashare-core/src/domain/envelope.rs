//! The response envelope returned by every history query.
//!
//! Invariants enforced by the constructors:
//! - `data_count == data.len()`
//! - `success == false` implies `data` is empty

use super::bar::QuoteBar;
use super::symbol::SymbolKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over the bars of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub change_percent: f64,
    pub max_price: f64,
    /// Lowest strictly positive low; `None` when no bar has a positive low.
    pub min_price: Option<f64>,
    pub avg_volume: u64,
}

impl Summary {
    pub fn zero() -> Self {
        Self {
            change_percent: 0.0,
            max_price: 0.0,
            min_price: Some(0.0),
            avg_volume: 0,
        }
    }

    /// Compute the summary for bars sorted by date ascending.
    pub fn from_bars(bars: &[QuoteBar]) -> Self {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Self::zero();
        };

        let change_percent = if first.close != 0.0 {
            (last.close - first.close) / first.close * 100.0
        } else {
            0.0
        };
        let max_price = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let min_price = bars
            .iter()
            .map(|b| b.low)
            .filter(|low| *low > 0.0)
            .fold(None, |acc: Option<f64>, low| Some(acc.map_or(low, |m| m.min(low))));
        let total_volume: u128 = bars.iter().map(|b| u128::from(b.volume)).sum();
        let avg_volume = (total_volume / bars.len() as u128) as u64;

        Self {
            change_percent: round2(change_percent),
            max_price: round2(max_price),
            min_price: min_price.map(round2),
            avg_volume,
        }
    }
}

/// Uniform JSON response for history queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub current_price: f64,
    pub data: Vec<QuoteBar>,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data_count: usize,
    pub last_update: String,
}

impl Envelope {
    /// Successful envelope over bars sorted by date ascending.
    pub fn success(
        code: &str,
        name: impl Into<String>,
        kind: SymbolKind,
        bars: Vec<QuoteBar>,
        now: NaiveDateTime,
    ) -> Self {
        let summary = Summary::from_bars(&bars);
        let current_price = bars.last().map(|b| b.close).unwrap_or(0.0);
        Self {
            success: true,
            code: code.to_string(),
            name: name.into(),
            kind,
            current_price,
            data_count: bars.len(),
            data: bars,
            summary,
            error: None,
            last_update: iso_timestamp(now),
        }
    }

    /// Failed envelope carrying a human-readable message and no data.
    pub fn failure(
        code: &str,
        kind: SymbolKind,
        message: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            name: placeholder_name(code, kind),
            kind,
            current_price: 0.0,
            data: Vec::new(),
            summary: Summary::zero(),
            error: Some(message.into()),
            data_count: 0,
            last_update: iso_timestamp(now),
        }
    }
}

/// Display name used when the provider supplies none.
pub fn placeholder_name(code: &str, kind: SymbolKind) -> String {
    match kind {
        SymbolKind::Index => format!("指数_{code}"),
        _ => format!("股票_{code}"),
    }
}

/// Local ISO-8601 timestamp with microseconds, as stamped into `lastUpdate`.
pub fn iso_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
