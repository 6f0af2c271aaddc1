//! History queries: range resolution → cache → provider → normalizer → cache.

use crate::data::{
    CacheKey, DataError, EnvelopeCache, Normalizer, Period, QuoteProvider, RangePolicy,
};
use crate::domain::{classify, lookup_index, Envelope, SymbolKind};
use chrono::{Local, NaiveDateTime};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Cache data-type tag for a kind and period.
///
/// Daily bars keep the bare tag so keys stay stable for the default period.
pub fn data_type(kind: SymbolKind, period: Period) -> String {
    match period {
        Period::Daily => kind.as_str().to_string(),
        other => format!("{}_{}", kind.as_str(), other.as_str()),
    }
}

/// Serves historical OHLCV envelopes for stocks and indices.
pub struct HistoryService<'a> {
    provider: &'a dyn QuoteProvider,
    cache: EnvelopeCache,
    policy: RangePolicy,
}

impl<'a> HistoryService<'a> {
    pub fn new(provider: &'a dyn QuoteProvider, cache: EnvelopeCache, policy: RangePolicy) -> Self {
        Self {
            provider,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &EnvelopeCache {
        &self.cache
    }

    /// Unified entry point: classify the symbol and dispatch.
    pub fn fetch(&self, symbol: &str, start: &str, end: &str, period: Period) -> Envelope {
        match classify(symbol) {
            SymbolKind::Stock => self.stock_history(symbol, start, end, period),
            SymbolKind::Index => self.index_history(symbol, start, end, period),
            SymbolKind::Unknown => Envelope::failure(
                symbol,
                SymbolKind::Unknown,
                format!("unrecognized symbol format: {symbol}"),
                local_now(),
            ),
        }
    }

    /// Historical bars for a six-digit stock code.
    pub fn stock_history(&self, code: &str, start: &str, end: &str, period: Period) -> Envelope {
        self.cached_fetch(code, SymbolKind::Stock, start, end, period)
            .unwrap_or_else(|e| {
                let message = format!("failed to fetch stock data: {e}");
                tracing::warn!(symbol = code, "{message}");
                Envelope::failure(code, SymbolKind::Stock, message, local_now())
            })
    }

    /// Historical bars for a supported index (`000001.SH`).
    pub fn index_history(&self, code: &str, start: &str, end: &str, period: Period) -> Envelope {
        self.cached_fetch(code, SymbolKind::Index, start, end, period)
            .unwrap_or_else(|e| {
                let message = format!("failed to fetch index data: {e}");
                tracing::warn!(symbol = code, "{message}");
                Envelope::failure(code, SymbolKind::Index, message, local_now())
            })
    }

    fn cached_fetch(
        &self,
        code: &str,
        kind: SymbolKind,
        start: &str,
        end: &str,
        period: Period,
    ) -> Result<Envelope, DataError> {
        let now = local_now();
        let range = self.policy.resolve(start, end, now.date());
        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();
        let data_type = data_type(kind, period);
        let key = CacheKey {
            symbol: code,
            start: &start,
            end: &end,
            data_type: &data_type,
        };

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let frame = match kind {
            SymbolKind::Index => {
                let Some(index) = lookup_index(code) else {
                    return Ok(Envelope::failure(
                        code,
                        kind,
                        DataError::UnsupportedIndex {
                            code: code.to_string(),
                        }
                        .to_string(),
                        now,
                    ));
                };
                tracing::info!(
                    symbol = code,
                    %start,
                    %end,
                    %period,
                    provider = self.provider.name(),
                    "fetching index history"
                );
                self.provider.index_history(index, range, period)?
            }
            _ => {
                tracing::info!(
                    symbol = code,
                    %start,
                    %end,
                    %period,
                    provider = self.provider.name(),
                    "fetching stock history"
                );
                self.provider.stock_history(code, range, period)?
            }
        };

        let envelope = Normalizer::new(now)
            .with_window(range)
            .normalize(frame, code, kind);

        if envelope.success {
            self.cache.set(&key, &envelope);
        }
        Ok(envelope)
    }
}
