//! ashare core: quote domain types, provider client, normalizer, caches and services.
//!
//! - Domain types (bars, envelopes, realtime replies, symbol classification)
//! - `QuoteProvider` trait and the Eastmoney client
//! - Normalizer reconciling heterogeneous provider frames into one envelope
//! - Disk TTL cache for history, in-memory TTL memo for realtime
//! - History and realtime services that never fail outward

pub mod config;
pub mod data;
pub mod domain;
pub mod service;
