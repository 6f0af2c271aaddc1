//! Domain types for the quote feed

pub mod bar;
pub mod envelope;
pub mod realtime;
pub mod symbol;

pub use bar::{QuoteBar, TickPoint};
pub use envelope::{Envelope, Summary};
pub use realtime::{
    ErrorReply, IndexSpot, MarketIndex, MarketReply, MarketStatus, QuoteReply, StockSpot,
    TickReply,
};
pub use symbol::{classify, lookup_index, Exchange, IndexInfo, SymbolKind, INDICES};
