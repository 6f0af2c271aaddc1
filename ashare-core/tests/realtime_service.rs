//! Integration tests for realtime snapshots, ticks and the market overview.

mod common;

use ashare_core::data::memo::DEFAULT_REALTIME_TTL;
use ashare_core::service::RealtimeService;
use common::{spot, ScriptedProvider};
use std::time::Duration;

fn minute_rows(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let minute = 31 + i;
            let (hour, minute) = (9 + minute / 60, minute % 60);
            format!(
                "2024-06-03 {hour:02}:{minute:02},10.00,{:.2},10.20,9.90,{}",
                10.0 + i as f64 * 0.01,
                1000 + i
            )
        })
        .collect()
}

#[test]
fn stock_quote_is_memoized() {
    let provider = ScriptedProvider {
        spot: Some(spot("600000", Some("浦发银行"), 6.62)),
        ..ScriptedProvider::default()
    };
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let first = service.stock_quote("600000");
    let second = service.stock_quote("600000");

    assert!(first.success);
    assert_eq!(first.name.as_deref(), Some("浦发银行"));
    assert_eq!(first, second);
    assert_eq!(provider.spot_calls(), 1);

    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["current_price"], 6.62);
    assert!(json.get("error").is_none());
}

#[test]
fn zero_ttl_always_refetches() {
    let provider = ScriptedProvider {
        spot: Some(spot("600000", None, 6.62)),
        ..ScriptedProvider::default()
    };
    let mut service = RealtimeService::new(&provider, Duration::ZERO, 50);

    let reply = service.stock_quote("600000");
    service.stock_quote("600000");

    assert_eq!(reply.name.as_deref(), Some("股票_600000"));
    assert_eq!(provider.spot_calls(), 2);
}

#[test]
fn bad_stock_code_never_reaches_provider() {
    let provider = ScriptedProvider::default();
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.stock_quote("12345");

    assert!(!reply.success);
    assert!(reply.quote.is_none());
    assert_eq!(provider.spot_calls(), 0);
}

#[test]
fn missing_snapshot_is_not_memoized() {
    let provider = ScriptedProvider::default();
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.stock_quote("000001");
    service.stock_quote("000001");

    assert!(!reply.success);
    assert_eq!(
        reply.error.as_deref(),
        Some("no realtime data found for 000001")
    );
    assert_eq!(provider.spot_calls(), 2);
}

#[test]
fn index_quote_takes_name_from_table() {
    let provider = ScriptedProvider {
        spot: Some(spot("000001", Some("SSE Composite"), 3050.12)),
        ..ScriptedProvider::default()
    };
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.index_quote("000001.SH");

    assert!(reply.success);
    assert_eq!(reply.name.as_deref(), Some("上证指数"));
    assert_eq!(reply.quote.as_ref().map(|q| q.current), Some(3050.12));
}

#[test]
fn unsupported_index_is_rejected() {
    let provider = ScriptedProvider::default();
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.index_quote("999999.SH");

    assert!(!reply.success);
    assert_eq!(
        reply.error.as_deref(),
        Some("unsupported index code: 999999.SH")
    );
    assert_eq!(provider.spot_calls(), 0);
}

#[test]
fn market_skips_failing_indices() {
    let provider = ScriptedProvider {
        spot: Some(spot("x", None, 100.0)),
        failing_indices: vec!["399001.SZ"],
        ..ScriptedProvider::default()
    };
    let mut service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.market();

    assert!(reply.success);
    let codes: Vec<&str> = reply.data.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, ["sh000001", "sz399006"]);
    assert_eq!(reply.data[1].name, "创业板指");
    assert_eq!(provider.spot_calls(), 3);

    service.market();
    assert_eq!(provider.spot_calls(), 3);
}

#[test]
fn ticks_keep_the_latest_points() {
    let provider = ScriptedProvider {
        minute_rows: minute_rows(60),
        ..ScriptedProvider::default()
    };
    let service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.ticks("600000");

    assert!(reply.success, "{:?}", reply.error);
    assert_eq!(reply.count, Some(50));
    assert_eq!(reply.data.len(), 50);
    assert_eq!(reply.data[0].time, "09:41");
    assert_eq!(reply.data[49].time, "10:30");

    service.ticks("600000");
    assert_eq!(provider.minute_calls(), 2);
}

#[test]
fn empty_minute_frame_is_reported() {
    let provider = ScriptedProvider::default();
    let service = RealtimeService::new(&provider, DEFAULT_REALTIME_TTL, 50);

    let reply = service.ticks("600000");

    assert!(!reply.success);
    assert!(reply.data.is_empty());
    assert_eq!(
        reply.error.as_deref(),
        Some("minute data unavailable: no minute data available")
    );
}
