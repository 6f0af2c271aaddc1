//! Provider access, normalization and caching

pub mod cache;
pub mod eastmoney;
pub mod memo;
pub mod normalize;
pub mod provider;
pub mod range;

pub use cache::{CacheKey, CacheStats, EnvelopeCache};
pub use eastmoney::EastmoneyProvider;
pub use memo::MemoCache;
pub use normalize::{NormalizeError, Normalizer};
pub use provider::{DataError, DateRange, Period, QuoteProvider, SpotQuote};
pub use range::RangePolicy;
