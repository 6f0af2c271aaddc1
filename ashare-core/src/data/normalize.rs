//! Normalizer: reshapes provider frames into the response envelope.
//!
//! Providers label the same OHLCV columns differently (`开盘`, `开盘价`, `open`).
//! The normalizer renames every known alias to the canonical schema, coerces
//! prices to f64 (unparseable → 0), sorts by date, drops duplicate dates and
//! computes the summary.

use super::provider::DateRange;
use crate::domain::envelope::placeholder_name;
use crate::domain::{lookup_index, Envelope, QuoteBar, SymbolKind, TickPoint};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;

/// Provider column label → canonical column name.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("日期", "date"),
    ("date", "date"),
    ("时间", "time"),
    ("time", "time"),
    ("开盘", "open"),
    ("开盘价", "open"),
    ("open", "open"),
    ("收盘", "close"),
    ("收盘价", "close"),
    ("close", "close"),
    ("最高", "high"),
    ("最高价", "high"),
    ("high", "high"),
    ("最低", "low"),
    ("最低价", "low"),
    ("low", "low"),
    ("成交量", "volume"),
    ("volume", "volume"),
    ("成交额", "amount"),
];

/// Columns a history frame must provide after renaming.
pub const REQUIRED_COLUMNS: [&str; 5] = ["date", "open", "close", "high", "low"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no data available")]
    Empty,

    #[error("incomplete data format, missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("data processing error: {0}")]
    Processing(String),
}

fn frame_err(e: PolarsError) -> NormalizeError {
    NormalizeError::Processing(e.to_string())
}

/// Canonical name for a provider column label.
pub fn canonical_name(label: &str) -> Option<&'static str> {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == label)
        .map(|(_, canonical)| *canonical)
}

/// Rename known aliases in place. A rename is skipped when its target already exists.
pub fn canonicalize_columns(df: &mut DataFrame) -> Result<(), NormalizeError> {
    let labels: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    for label in labels {
        let Some(target) = canonical_name(&label) else {
            continue;
        };
        if target == label || df.column(target).is_ok() {
            continue;
        }
        df.rename(&label, target.into()).map_err(frame_err)?;
    }
    Ok(())
}

/// Column coerced to f64; nulls, NaN and unparseable cells become 0.
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, NormalizeError> {
    let cast = df
        .column(name)
        .map_err(frame_err)?
        .cast(&DataType::Float64)
        .map_err(frame_err)?;
    let values = cast.f64().map_err(frame_err)?;
    Ok(values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
        .collect())
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, NormalizeError> {
    let cast = df
        .column(name)
        .map_err(frame_err)?
        .cast(&DataType::String)
        .map_err(frame_err)?;
    let values = cast.str().map_err(frame_err)?;
    Ok(values.iter().map(|v| v.map(String::from)).collect())
}

fn volume_column(df: &DataFrame) -> Result<Vec<u64>, NormalizeError> {
    if df.column("volume").is_err() {
        return Ok(vec![0; df.height()]);
    }
    Ok(numeric_column(df, "volume")?
        .into_iter()
        .map(|v| v.max(0.0) as u64)
        .collect())
}

/// Parse a provider date cell (`2024-01-02`, `20240102`, `2024/01/02`, or a datetime).
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_datetime(raw).map(|dt| dt.date()))
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

/// Frame → envelope conversion for one request.
#[derive(Debug, Clone)]
pub struct Normalizer {
    now: NaiveDateTime,
    window: Option<DateRange>,
}

impl Normalizer {
    /// `now` stamps `lastUpdate`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now, window: None }
    }

    /// Keep only bars dated within `window`.
    pub fn with_window(mut self, window: DateRange) -> Self {
        self.window = Some(window);
        self
    }

    /// Build the envelope. Never fails: problems become a `success=false` envelope.
    pub fn normalize(&self, df: DataFrame, symbol: &str, kind: SymbolKind) -> Envelope {
        match self.bars(df) {
            Ok(bars) => Envelope::success(symbol, display_name(symbol, kind), kind, bars, self.now),
            Err(e) => Envelope::failure(symbol, kind, e.to_string(), self.now),
        }
    }

    /// Extract sorted, de-duplicated bars within the window.
    pub fn bars(&self, mut df: DataFrame) -> Result<Vec<QuoteBar>, NormalizeError> {
        if df.height() == 0 {
            return Err(NormalizeError::Empty);
        }

        canonicalize_columns(&mut df)?;

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(NormalizeError::MissingColumns(missing));
        }

        let dates = text_column(&df, "date")?;
        let opens = numeric_column(&df, "open")?;
        let closes = numeric_column(&df, "close")?;
        let highs = numeric_column(&df, "high")?;
        let lows = numeric_column(&df, "low")?;
        let volumes = volume_column(&df)?;

        let mut bars = Vec::with_capacity(df.height());
        for (i, raw) in dates.iter().enumerate() {
            let raw = raw
                .as_deref()
                .ok_or_else(|| NormalizeError::Processing(format!("missing date at row {i}")))?;
            let date = parse_day(raw)
                .ok_or_else(|| NormalizeError::Processing(format!("unparseable date '{raw}'")))?;

            bars.push(QuoteBar {
                date,
                open: opens[i],
                close: closes[i],
                high: highs[i],
                low: lows[i],
                volume: volumes[i],
            });
        }

        if let Some(window) = &self.window {
            bars.retain(|b| window.contains(b.date));
        }
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if bars.is_empty() {
            return Err(NormalizeError::Empty);
        }
        Ok(bars)
    }
}

/// Display name for a successful envelope.
pub fn display_name(symbol: &str, kind: SymbolKind) -> String {
    match (kind, lookup_index(symbol)) {
        (SymbolKind::Index, Some(index)) => index.name.to_string(),
        _ => placeholder_name(symbol, SymbolKind::Stock),
    }
}

/// Last `count` rows of a minute frame as tick points, oldest first.
pub fn ticks(mut df: DataFrame, count: usize) -> Result<Vec<TickPoint>, NormalizeError> {
    if df.height() == 0 {
        return Err(NormalizeError::Empty);
    }

    canonicalize_columns(&mut df)?;

    let missing: Vec<String> = ["time", "close"]
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::MissingColumns(missing));
    }

    let times = text_column(&df, "time")?;
    let prices = numeric_column(&df, "close")?;
    let volumes = volume_column(&df)?;

    let skip = df.height().saturating_sub(count);
    Ok(times
        .into_iter()
        .zip(prices)
        .zip(volumes)
        .skip(skip)
        .map(|((time, price), volume)| TickPoint {
            time: time
                .as_deref()
                .map(|raw| {
                    parse_datetime(raw)
                        .map(|dt| dt.format("%H:%M").to_string())
                        .unwrap_or_else(|| raw.to_string())
                })
                .unwrap_or_default(),
            price,
            volume,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn chinese_labels_are_renamed() {
        let df = df!(
            "日期" => &["2024-03-05", "2024-03-04"],
            "开盘" => &["10.0", "9.5"],
            "收盘" => &["10.5", "10.0"],
            "最高" => &["10.8", "10.2"],
            "最低" => &["9.9", "9.4"],
            "成交量" => &["1200", "800"],
            "成交额" => &["12000.0", "8000.0"]
        )
        .unwrap();

        let env = Normalizer::new(now()).normalize(df, "600000", SymbolKind::Stock);
        assert!(env.success);
        assert_eq!(env.name, "股票_600000");
        assert_eq!(env.data_count, 2);
        assert_eq!(env.data[0].date, day(4));
        assert_eq!(env.data[1].close, 10.5);
        assert_eq!(env.current_price, 10.5);
        assert_eq!(env.summary.change_percent, 5.0);
        assert_eq!(env.summary.avg_volume, 1000);
    }

    #[test]
    fn index_labels_and_names() {
        let df = df!(
            "date" => &["2024-03-04"],
            "开盘价" => &[3000.0],
            "收盘价" => &[3010.0],
            "最高价" => &[3020.0],
            "最低价" => &[2990.0]
        )
        .unwrap();

        let env = Normalizer::new(now()).normalize(df, "000001.SH", SymbolKind::Index);
        assert!(env.success);
        assert_eq!(env.name, "上证指数");
        assert_eq!(env.data[0].volume, 0);
    }

    #[test]
    fn missing_columns_fail_descriptively() {
        let df = df!("date" => &["2024-03-04"], "open" => &[1.0], "close" => &[1.0]).unwrap();
        let env = Normalizer::new(now()).normalize(df, "600000", SymbolKind::Stock);
        assert!(!env.success);
        assert!(env.data.is_empty());
        let msg = env.error.unwrap();
        assert!(msg.contains("missing columns"), "{msg}");
        assert!(msg.contains("high") && msg.contains("low"), "{msg}");
    }

    #[test]
    fn unparseable_numbers_become_zero() {
        let df = df!(
            "date" => &["2024-03-04"],
            "open" => &["-"],
            "close" => &["10.0"],
            "high" => &[""],
            "low" => &["9.0"],
            "volume" => &["n/a"]
        )
        .unwrap();
        let bars = Normalizer::new(now()).bars(df).unwrap();
        assert_eq!(bars[0].open, 0.0);
        assert_eq!(bars[0].high, 0.0);
        assert_eq!(bars[0].volume, 0);
        assert_eq!(bars[0].close, 10.0);
    }

    #[test]
    fn window_and_duplicates() {
        let df = df!(
            "date" => &["2024-03-01", "2024-03-05", "2024-03-04", "2024-03-05", "2024-03-09"],
            "open" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "close" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "high" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "low" => &[1.0, 2.0, 3.0, 4.0, 5.0]
        )
        .unwrap();
        let window = DateRange {
            start: day(2),
            end: day(8),
        };
        let bars = Normalizer::new(now()).with_window(window).bars(df).unwrap();
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(4), day(5)]);
        assert_eq!(bars[1].close, 2.0); // first occurrence kept
    }

    #[test]
    fn nothing_in_window_is_empty() {
        let df = df!(
            "date" => &["2024-01-01"],
            "open" => &[1.0],
            "close" => &[1.0],
            "high" => &[1.0],
            "low" => &[1.0]
        )
        .unwrap();
        let window = DateRange {
            start: day(2),
            end: day(8),
        };
        let env = Normalizer::new(now())
            .with_window(window)
            .normalize(df, "600000", SymbolKind::Stock);
        assert_eq!(env.error.as_deref(), Some("no data available"));
    }

    #[test]
    fn bad_date_is_a_processing_error() {
        let df = df!(
            "date" => &["yesterday"],
            "open" => &[1.0],
            "close" => &[1.0],
            "high" => &[1.0],
            "low" => &[1.0]
        )
        .unwrap();
        let err = Normalizer::new(now()).bars(df).unwrap_err();
        assert!(matches!(err, NormalizeError::Processing(_)));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_day("20240304"), Some(day(4)));
        assert_eq!(parse_day("2024/03/04"), Some(day(4)));
        assert_eq!(parse_day("2024-03-04 15:00:00"), Some(day(4)));
        assert_eq!(parse_day("04/03/2024"), None);
    }

    #[test]
    fn ticks_take_the_tail() {
        let df = df!(
            "时间" => &["2024-03-08 14:58", "2024-03-08 14:59", "2024-03-08 15:00"],
            "开盘" => &["10.0", "10.1", "10.2"],
            "收盘" => &["10.1", "10.2", "10.3"],
            "成交量" => &["100", "200", "300"]
        )
        .unwrap();
        let points = ticks(df, 2).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, "14:59");
        assert_eq!(points[1].price, 10.3);
        assert_eq!(points[1].volume, 300);
    }

    #[test]
    fn empty_frame_has_no_ticks() {
        let df = df!("时间" => Vec::<String>::new(), "收盘" => Vec::<String>::new()).unwrap();
        assert!(matches!(ticks(df, 50), Err(NormalizeError::Empty)));
    }
}
