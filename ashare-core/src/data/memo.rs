//! Process-lifetime memo for realtime replies.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time-to-live for realtime entries.
pub const DEFAULT_REALTIME_TTL: Duration = Duration::from_secs(60);

/// In-memory TTL map. Stale entries are evicted when looked up.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: HashMap<String, (Instant, V)>,
    ttl: Duration,
}

impl<V: Clone> MemoCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Value stored under `key` if it is younger than the TTL at `now`.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let (stored_at, value) = self.entries.get(key)?;
        if now.saturating_duration_since(*stored_at) < self.ttl {
            return Some(value.clone());
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: impl Into<String>, value: V, now: Instant) {
        self.entries.insert(key.into(), (now, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
