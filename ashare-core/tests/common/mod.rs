//! Scripted in-process provider shared by the service tests.

#![allow(dead_code)]

use ashare_core::data::eastmoney::{
    klines_to_frame, INDEX_HISTORY_COLUMNS, MINUTE_COLUMNS, STOCK_HISTORY_COLUMNS,
};
use ashare_core::data::{DataError, DateRange, Period, QuoteProvider, SpotQuote};
use ashare_core::domain::IndexInfo;
use chrono::{Duration, Local, NaiveDate};
use polars::prelude::DataFrame;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `n` consecutive daily kline rows ending yesterday.
pub fn recent_rows(n: i64) -> Vec<String> {
    (1..=n)
        .rev()
        .map(|back| {
            let date = today() - Duration::days(back);
            let close = 10.0 + back as f64 * 0.1;
            format!(
                "{},{:.2},{:.2},{:.2},{:.2},{},{:.1}",
                ymd(date),
                close - 0.05,
                close,
                close + 0.1,
                close - 0.1,
                1000 + back,
                close * 1000.0
            )
        })
        .collect()
}

pub fn spot(code: &str, name: Option<&str>, last: f64) -> SpotQuote {
    SpotQuote {
        code: code.to_string(),
        name: name.map(str::to_string),
        last: Some(last),
        change_percent: Some(1.25),
        change_amount: Some(0.12),
        high: Some(last + 0.2),
        low: Some(last - 0.2),
        open: Some(last - 0.05),
        prev_close: Some(last - 0.12),
        volume: Some(123_456),
        turnover: Some(9_876_543.0),
    }
}

/// Provider answering from fixed rows and counting every call.
#[derive(Default)]
pub struct ScriptedProvider {
    pub history_rows: Vec<String>,
    pub minute_rows: Vec<String>,
    pub spot: Option<SpotQuote>,
    pub fail_history: bool,
    /// Index codes whose snapshot request errors.
    pub failing_indices: Vec<&'static str>,
    pub history_calls: AtomicUsize,
    pub spot_calls: AtomicUsize,
    pub minute_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn with_history(rows: Vec<String>) -> Self {
        Self {
            history_rows: rows,
            ..Self::default()
        }
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn spot_calls(&self) -> usize {
        self.spot_calls.load(Ordering::SeqCst)
    }

    pub fn minute_calls(&self) -> usize {
        self.minute_calls.load(Ordering::SeqCst)
    }

    fn history(&self, labels: &[&str]) -> Result<DataFrame, DataError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_history {
            return Err(DataError::NetworkUnreachable("connection refused".into()));
        }
        klines_to_frame(&self.history_rows, labels)
    }
}

impl QuoteProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stock_history(
        &self,
        _code: &str,
        _range: DateRange,
        _period: Period,
    ) -> Result<DataFrame, DataError> {
        self.history(&STOCK_HISTORY_COLUMNS)
    }

    fn index_history(
        &self,
        _index: &IndexInfo,
        _range: DateRange,
        _period: Period,
    ) -> Result<DataFrame, DataError> {
        self.history(&INDEX_HISTORY_COLUMNS)
    }

    fn stock_spot(&self, _code: &str) -> Result<Option<SpotQuote>, DataError> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.spot.clone())
    }

    fn index_spot(&self, index: &IndexInfo) -> Result<Option<SpotQuote>, DataError> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_indices.contains(&index.code) {
            return Err(DataError::HttpStatus { status: 502 });
        }
        Ok(self.spot.clone())
    }

    fn minute_bars(&self, _code: &str) -> Result<DataFrame, DataError> {
        self.minute_calls.fetch_add(1, Ordering::SeqCst);
        klines_to_frame(&self.minute_rows, &MINUTE_COLUMNS)
    }
}
