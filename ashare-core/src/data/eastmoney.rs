//! Eastmoney quote provider.
//!
//! History and minute bars come from the `push2his` kline endpoint, whose
//! `klines` array holds comma-separated rows `date,open,close,high,low,volume,amount`.
//! Snapshots come from the `push2` stock endpoint, whose prices are integers
//! scaled by `10^f152`.
//!
//! Each call issues exactly one request. Failures map onto [`DataError`] and
//! are surfaced to the caller unchanged.

use super::provider::{DataError, DateRange, Period, QuoteProvider, SpotQuote};
use crate::config::ProviderConfig;
use crate::domain::symbol::{stock_secid, IndexInfo};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Labels of the stock history frame, in kline field order.
pub const STOCK_HISTORY_COLUMNS: [&str; 7] = ["日期", "开盘", "收盘", "最高", "最低", "成交量", "成交额"];

/// Labels of the index history frame, in kline field order.
pub const INDEX_HISTORY_COLUMNS: [&str; 6] = ["date", "open", "close", "high", "low", "volume"];

/// Labels of the minute frame, in kline field order.
pub const MINUTE_COLUMNS: [&str; 6] = ["时间", "开盘", "收盘", "最高", "最低", "成交量"];

const KLINE_FIELDS1: &str = "f1,f2,f3,f4,f5,f6";
const KLINE_FIELDS2: &str = "f51,f52,f53,f54,f55,f56,f57";
const SPOT_FIELDS: &str = "f43,f44,f45,f46,f47,f48,f57,f58,f60,f152,f169,f170";

/// Minute bars in one full session (4 hours).
const SESSION_MINUTES: u32 = 240;

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: Option<SpotData>,
}

#[derive(Debug, Default, Deserialize)]
struct SpotData {
    #[serde(default)]
    f43: Value,
    #[serde(default)]
    f44: Value,
    #[serde(default)]
    f45: Value,
    #[serde(default)]
    f46: Value,
    #[serde(default)]
    f47: Value,
    #[serde(default)]
    f48: Value,
    #[serde(default)]
    f57: Value,
    #[serde(default)]
    f58: Value,
    #[serde(default)]
    f60: Value,
    #[serde(default)]
    f152: Value,
    #[serde(default)]
    f169: Value,
    #[serde(default)]
    f170: Value,
}

impl SpotData {
    /// Descale the raw integer fields into a [`SpotQuote`].
    fn into_quote(self, code: &str) -> SpotQuote {
        let decimals = number(&self.f152)
            .map(|d| d.clamp(0.0, 6.0) as i32)
            .unwrap_or(2);
        let scale = 10f64.powi(decimals);
        let price = |v: &Value| number(v).map(|x| x / scale);

        SpotQuote {
            code: text(&self.f57).unwrap_or_else(|| code.to_string()),
            name: text(&self.f58),
            last: price(&self.f43),
            change_percent: number(&self.f170).map(|x| x / 100.0),
            change_amount: price(&self.f169),
            high: price(&self.f44),
            low: price(&self.f45),
            open: price(&self.f46),
            prev_close: price(&self.f60),
            volume: number(&self.f47).filter(|v| *v >= 0.0).map(|v| v as u64),
            turnover: number(&self.f48),
        }
    }
}

/// Numeric field that may arrive as a number, a numeric string, or a `"-"` placeholder.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
        .map(String::from)
}

/// Kline aggregation code for a bar period.
fn klt(period: Period) -> u32 {
    match period {
        Period::Daily => 101,
        Period::Weekly => 102,
        Period::Monthly => 103,
    }
}

/// Split comma-separated kline rows into a string-typed frame with the given labels.
///
/// Short rows are padded with empty cells, which later coerce to zero.
pub fn klines_to_frame(rows: &[String], labels: &[&str]) -> Result<DataFrame, DataError> {
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); labels.len()];
    for row in rows {
        let mut fields = row.split(',');
        for column in columns.iter_mut() {
            column.push(fields.next().unwrap_or("").trim().to_string());
        }
    }

    let columns: Vec<Column> = labels
        .iter()
        .zip(columns)
        .map(|(label, values)| Column::new((*label).into(), values))
        .collect();

    DataFrame::new(columns).map_err(|e| DataError::Frame(format!("kline frame: {e}")))
}

/// Eastmoney data provider.
pub struct EastmoneyProvider {
    client: reqwest::blocking::Client,
    history_url: String,
    quote_url: String,
}

impl EastmoneyProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            history_url: config.history_url.trim_end_matches('/').to_string(),
            quote_url: config.quote_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issue a single GET and decode the JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, DataError> {
        let resp = self.client.get(url).query(params).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(format!("request to {url} failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
            });
        }

        resp.json::<T>().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response from {url}: {e}"))
        })
    }

    fn klines(
        &self,
        secid: &str,
        klt: u32,
        beg: String,
        end: String,
        limit: Option<u32>,
    ) -> Result<Option<Vec<String>>, DataError> {
        let url = format!("{}/api/qt/stock/kline/get", self.history_url);
        let mut params = vec![
            ("secid", secid.to_string()),
            ("fields1", KLINE_FIELDS1.to_string()),
            ("fields2", KLINE_FIELDS2.to_string()),
            ("klt", klt.to_string()),
            ("fqt", "0".to_string()),
            ("beg", beg),
            ("end", end),
        ];
        if let Some(lmt) = limit {
            params.push(("lmt", lmt.to_string()));
        }

        let resp: KlineResponse = self.get_json(&url, &params)?;
        Ok(resp.data.map(|d| d.klines))
    }

    fn ranged_klines(
        &self,
        secid: &str,
        symbol: &str,
        range: DateRange,
        period: Period,
    ) -> Result<Vec<String>, DataError> {
        self.klines(
            secid,
            klt(period),
            range.start.format("%Y%m%d").to_string(),
            range.end.format("%Y%m%d").to_string(),
            None,
        )?
        .ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }

    fn spot(&self, secid: &str, code: &str) -> Result<Option<SpotQuote>, DataError> {
        let url = format!("{}/api/qt/stock/get", self.quote_url);
        let params = [
            ("secid", secid.to_string()),
            ("fields", SPOT_FIELDS.to_string()),
        ];
        let resp: SpotResponse = self.get_json(&url, &params)?;
        Ok(resp.data.map(|d| d.into_quote(code)))
    }
}

fn require_secid(code: &str) -> Result<String, DataError> {
    stock_secid(code).ok_or_else(|| DataError::SymbolNotFound {
        symbol: code.to_string(),
    })
}

impl QuoteProvider for EastmoneyProvider {
    fn name(&self) -> &str {
        "eastmoney"
    }

    fn stock_history(
        &self,
        code: &str,
        range: DateRange,
        period: Period,
    ) -> Result<DataFrame, DataError> {
        let secid = require_secid(code)?;
        let rows = self.ranged_klines(&secid, code, range, period)?;
        klines_to_frame(&rows, &STOCK_HISTORY_COLUMNS)
    }

    fn index_history(
        &self,
        index: &IndexInfo,
        range: DateRange,
        period: Period,
    ) -> Result<DataFrame, DataError> {
        let rows = self.ranged_klines(&index.secid(), index.code, range, period)?;
        klines_to_frame(&rows, &INDEX_HISTORY_COLUMNS)
    }

    fn stock_spot(&self, code: &str) -> Result<Option<SpotQuote>, DataError> {
        let secid = require_secid(code)?;
        self.spot(&secid, code)
    }

    fn index_spot(&self, index: &IndexInfo) -> Result<Option<SpotQuote>, DataError> {
        self.spot(&index.secid(), index.code)
    }

    fn minute_bars(&self, code: &str) -> Result<DataFrame, DataError> {
        let secid = require_secid(code)?;
        let rows = self
            .klines(
                &secid,
                1,
                "0".to_string(),
                "20500101".to_string(),
                Some(SESSION_MINUTES),
            )?
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: code.to_string(),
            })?;
        klines_to_frame(&rows, &MINUTE_COLUMNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kline_rows_become_labelled_columns() {
        let rows = vec![
            "2024-01-02,6.60,6.62,6.64,6.56,336541,222578160.00".to_string(),
            "2024-01-03,6.62,6.65,6.69,6.60,298100".to_string(),
        ];
        let df = klines_to_frame(&rows, &STOCK_HISTORY_COLUMNS).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);
        let dates = df.column("日期").unwrap().str().unwrap();
        assert_eq!(dates.get(1), Some("2024-01-03"));
        let amount = df.column("成交额").unwrap().str().unwrap();
        assert_eq!(amount.get(1), Some(""));
    }

    #[test]
    fn empty_klines_give_empty_frame() {
        let df = klines_to_frame(&[], &INDEX_HISTORY_COLUMNS).unwrap();
        assert_eq!(df.height(), 0);
        assert!(df.column("close").is_ok());
    }

    #[test]
    fn spot_fields_are_descaled() {
        let body = r#"{"rc":0,"data":{"f43":662,"f44":664,"f45":656,"f46":660,"f47":336541,
            "f48":222578160.0,"f57":"600000","f58":"浦发银行","f60":660,"f152":2,"f169":2,"f170":30}}"#;
        let resp: SpotResponse = serde_json::from_str(body).unwrap();
        let quote = resp.data.unwrap().into_quote("600000");
        assert_eq!(quote.name.as_deref(), Some("浦发银行"));
        assert_eq!(quote.last, Some(6.62));
        assert_eq!(quote.change_percent, Some(0.3));
        assert_eq!(quote.change_amount, Some(0.02));
        assert_eq!(quote.prev_close, Some(6.6));
        assert_eq!(quote.volume, Some(336_541));
    }

    #[test]
    fn suspended_placeholders_read_as_absent() {
        let body = r#"{"data":{"f43":"-","f47":"-","f57":"600000","f58":"浦发银行"}}"#;
        let resp: SpotResponse = serde_json::from_str(body).unwrap();
        let quote = resp.data.unwrap().into_quote("600000");
        assert_eq!(quote.last, None);
        assert_eq!(quote.volume, None);
        assert_eq!(quote.high, None);
    }

    #[test]
    fn null_data_means_unknown_code() {
        let resp: SpotResponse = serde_json::from_str(r#"{"rc":0,"data":null}"#).unwrap();
        assert!(resp.data.is_none());
        let resp: KlineResponse = serde_json::from_str(r#"{"rc":0,"data":null}"#).unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn period_codes() {
        assert_eq!(klt(Period::Daily), 101);
        assert_eq!(klt(Period::Weekly), 102);
        assert_eq!(klt(Period::Monthly), 103);
    }
}
