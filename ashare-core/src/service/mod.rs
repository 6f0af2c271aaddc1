//! Query services sitting between the command façade and the provider.
//!
//! Services never return errors: every failure becomes a reply with
//! `success = false` and a message.

pub mod history;
pub mod realtime;

pub use history::HistoryService;
pub use realtime::RealtimeService;
