//! Realtime queries: stock and index snapshots, minute ticks, market overview.
//!
//! Snapshots and the overview are memoized for the realtime TTL; ticks are
//! always fetched. Only successful replies are memoized.

use crate::data::normalize::{self, NormalizeError};
use crate::data::{MemoCache, QuoteProvider, SpotQuote};
use crate::domain::envelope::placeholder_name;
use crate::domain::symbol::{stock_exchange, MARKET_INDICES};
use crate::domain::{
    lookup_index, IndexSpot, MarketIndex, MarketReply, QuoteReply, StockSpot, SymbolKind,
    TickReply,
};
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl From<&SpotQuote> for StockSpot {
    fn from(q: &SpotQuote) -> Self {
        Self {
            current_price: q.last.unwrap_or(0.0),
            change_percent: q.change_percent.unwrap_or(0.0),
            change_amount: q.change_amount.unwrap_or(0.0),
            volume: q.volume.unwrap_or(0),
            turnover: q.turnover.unwrap_or(0.0),
            high: q.high.unwrap_or(0.0),
            low: q.low.unwrap_or(0.0),
            open: q.open.unwrap_or(0.0),
            yesterday_close: q.prev_close.unwrap_or(0.0),
        }
    }
}

impl From<&SpotQuote> for IndexSpot {
    fn from(q: &SpotQuote) -> Self {
        Self {
            current: q.last.unwrap_or(0.0),
            change_percent: q.change_percent.unwrap_or(0.0),
            change_amount: q.change_amount.unwrap_or(0.0),
            high: q.high.unwrap_or(0.0),
            low: q.low.unwrap_or(0.0),
            open: q.open.unwrap_or(0.0),
            yesterday_close: q.prev_close.unwrap_or(0.0),
            volume: q.volume.unwrap_or(0),
            turnover: q.turnover.unwrap_or(0.0),
        }
    }
}

/// Serves realtime snapshots with a short in-memory memo.
pub struct RealtimeService<'a> {
    provider: &'a dyn QuoteProvider,
    stocks: MemoCache<QuoteReply<StockSpot>>,
    indices: MemoCache<QuoteReply<IndexSpot>>,
    market: MemoCache<MarketReply>,
    tick_count: usize,
}

impl<'a> RealtimeService<'a> {
    pub fn new(provider: &'a dyn QuoteProvider, ttl: Duration, tick_count: usize) -> Self {
        Self {
            provider,
            stocks: MemoCache::new(ttl),
            indices: MemoCache::new(ttl),
            market: MemoCache::new(ttl),
            tick_count,
        }
    }

    /// Latest snapshot for a six-digit stock code.
    pub fn stock_quote(&mut self, code: &str) -> QuoteReply<StockSpot> {
        let key = format!("realtime_{code}");
        if let Some(hit) = self.stocks.get(&key) {
            return hit;
        }

        let now = local_now();
        if stock_exchange(code).is_none() {
            return QuoteReply::failed(code, format!("unrecognized stock code: {code}"), now);
        }

        tracing::info!(symbol = code, provider = self.provider.name(), "fetching realtime quote");
        match self.provider.stock_spot(code) {
            Ok(Some(quote)) => {
                let name = quote
                    .name
                    .clone()
                    .unwrap_or_else(|| placeholder_name(code, SymbolKind::Stock));
                let reply = QuoteReply::ok(code, name, StockSpot::from(&quote), now);
                self.stocks.insert(key, reply.clone());
                reply
            }
            Ok(None) => QuoteReply::failed(code, format!("no realtime data found for {code}"), now),
            Err(e) => {
                let message = format!("failed to fetch realtime data: {e}");
                tracing::warn!(symbol = code, "{message}");
                QuoteReply::failed(code, message, now)
            }
        }
    }

    /// Latest snapshot for a supported index (`000001.SH`).
    pub fn index_quote(&mut self, code: &str) -> QuoteReply<IndexSpot> {
        let key = format!("index_realtime_{code}");
        if let Some(hit) = self.indices.get(&key) {
            return hit;
        }

        let now = local_now();
        let Some(index) = lookup_index(code) else {
            return QuoteReply::failed(code, format!("unsupported index code: {code}"), now);
        };

        tracing::info!(symbol = code, provider = self.provider.name(), "fetching index quote");
        match self.provider.index_spot(index) {
            Ok(Some(quote)) => {
                let reply = QuoteReply::ok(code, index.name.to_string(), IndexSpot::from(&quote), now);
                self.indices.insert(key, reply.clone());
                reply
            }
            Ok(None) => {
                QuoteReply::failed(code, format!("no realtime data found for index {code}"), now)
            }
            Err(e) => {
                let message = format!("failed to fetch index realtime data: {e}");
                tracing::warn!(symbol = code, "{message}");
                QuoteReply::failed(code, message, now)
            }
        }
    }

    /// The most recent minute points for a stock. Never memoized.
    pub fn ticks(&self, code: &str) -> TickReply {
        let now = local_now();
        if stock_exchange(code).is_none() {
            return TickReply::failed(code, format!("unrecognized stock code: {code}"), now);
        }

        tracing::info!(symbol = code, provider = self.provider.name(), "fetching minute data");
        let points = self
            .provider
            .minute_bars(code)
            .map_err(|e| e.to_string())
            .and_then(|frame| match normalize::ticks(frame, self.tick_count) {
                Ok(points) => Ok(points),
                Err(NormalizeError::Empty) => Err("no minute data available".to_string()),
                Err(e) => Err(e.to_string()),
            });

        match points {
            Ok(points) => TickReply::ok(code, points, now),
            Err(reason) => {
                tracing::warn!(symbol = code, %reason, "minute data unavailable");
                TickReply::failed(code, format!("minute data unavailable: {reason}"), now)
            }
        }
    }

    /// Overview of the headline indices. Indices that fail are left out.
    pub fn market(&mut self) -> MarketReply {
        const KEY: &str = "market_realtime";
        if let Some(hit) = self.market.get(KEY) {
            return hit;
        }

        tracing::info!(provider = self.provider.name(), "fetching market overview");
        let rows: Vec<MarketIndex> = MARKET_INDICES
            .iter()
            .filter_map(|code| lookup_index(code))
            .filter_map(|index| match self.provider.index_spot(index) {
                Ok(Some(quote)) => Some(MarketIndex {
                    code: index.prefixed_code(),
                    name: quote.name.clone().unwrap_or_else(|| index.name.to_string()),
                    current: quote.last.unwrap_or(0.0),
                    change_percent: quote.change_percent.unwrap_or(0.0),
                    change_amount: quote.change_amount.unwrap_or(0.0),
                }),
                Ok(None) => {
                    tracing::warn!(symbol = index.code, "no snapshot for market index");
                    None
                }
                Err(e) => {
                    tracing::warn!(symbol = index.code, error = %e, "failed to fetch market index");
                    None
                }
            })
            .collect();

        let reply = MarketReply::ok(rows, local_now());
        self.market.insert(KEY, reply.clone());
        reply
    }
}
