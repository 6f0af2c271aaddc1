//! Symbol classification and the supported index table.
//!
//! A-share stocks are six-digit codes whose prefix names the board:
//! `60` (Shanghai main board), `00` (Shenzhen main board) and `30` (ChiNext).
//! Indices are addressed with an exchange suffix (`000001.SH`) and must be
//! listed in [`INDICES`]; anything else is unknown.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a requested symbol refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Stock,
    Index,
    Unknown,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Stock => "stock",
            SymbolKind::Index => "index",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
}

impl Exchange {
    /// Market id used by the quote provider in `secid=<market>.<code>`.
    pub fn market_id(&self) -> u8 {
        match self {
            Exchange::Shanghai => 1,
            Exchange::Shenzhen => 0,
        }
    }

    /// Lowercase exchange prefix (`sh` / `sz`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
        }
    }
}

/// A supported index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexInfo {
    /// Suffixed code as accepted on the command line, e.g. `000001.SH`.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    pub exchange: Exchange,
}

impl IndexInfo {
    /// The bare six-digit code (`000001`).
    pub fn bare_code(&self) -> &'static str {
        self.code.split('.').next().unwrap_or(self.code)
    }

    /// Exchange-prefixed code (`sh000001`).
    pub fn prefixed_code(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.bare_code())
    }

    /// Provider security id (`1.000001`).
    pub fn secid(&self) -> String {
        format!("{}.{}", self.exchange.market_id(), self.bare_code())
    }
}

/// Indices the feed knows how to serve.
pub const INDICES: &[IndexInfo] = &[
    IndexInfo { code: "000001.SH", name: "上证指数", exchange: Exchange::Shanghai },
    IndexInfo { code: "399001.SZ", name: "深证成指", exchange: Exchange::Shenzhen },
    IndexInfo { code: "399006.SZ", name: "创业板指", exchange: Exchange::Shenzhen },
    IndexInfo { code: "399005.SZ", name: "中小板指", exchange: Exchange::Shenzhen },
    IndexInfo { code: "000300.SH", name: "沪深300", exchange: Exchange::Shanghai },
    IndexInfo { code: "000905.SH", name: "中证500", exchange: Exchange::Shanghai },
    IndexInfo { code: "000852.SH", name: "中证1000", exchange: Exchange::Shanghai },
];

/// Indices included in the market overview, in display order.
pub const MARKET_INDICES: &[&str] = &["000001.SH", "399001.SZ", "399006.SZ"];

/// Look up a supported index by its suffixed code.
pub fn lookup_index(code: &str) -> Option<&'static IndexInfo> {
    INDICES.iter().find(|idx| idx.code == code)
}

/// Classify a requested symbol.
pub fn classify(symbol: &str) -> SymbolKind {
    if lookup_index(symbol).is_some() {
        return SymbolKind::Index;
    }
    if stock_exchange(symbol).is_some() {
        return SymbolKind::Stock;
    }
    SymbolKind::Unknown
}

/// Exchange for a six-digit A-share stock code, `None` if the code is not one.
pub fn stock_exchange(code: &str) -> Option<Exchange> {
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match &code[..2] {
        "60" => Some(Exchange::Shanghai),
        "00" | "30" => Some(Exchange::Shenzhen),
        _ => None,
    }
}

/// Provider security id for a stock code (`1.600000`, `0.000001`).
pub fn stock_secid(code: &str) -> Option<String> {
    stock_exchange(code).map(|ex| format!("{}.{code}", ex.market_id()))
}
