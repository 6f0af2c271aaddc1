//! Disk cache for history envelopes.
//!
//! Layout: `{cache_dir}/{blake3(symbol_start_end_type)}.json`
//!
//! - Expiry clock is the file's modification time; stale files are deleted
//!   on the next lookup, never swept in the background.
//! - Lookups fail open: any I/O or decode problem reads as a miss.
//! - Writes are atomic (write to .tmp, rename into place) and failures are
//!   logged and swallowed.

use crate::domain::Envelope;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default time-to-live for history entries.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(60 * 60);

/// The four strings an entry is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub symbol: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub data_type: &'a str,
}

impl CacheKey<'_> {
    /// Content hash naming the entry file.
    pub fn digest(&self) -> String {
        let joined = format!("{}_{}_{}_{}", self.symbol, self.start, self.end, self.data_type);
        blake3::hash(joined.as_bytes()).to_hex().to_string()
    }
}

/// Aggregate view of the cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub bytes: u64,
}

/// TTL-expiring envelope store.
#[derive(Debug, Clone)]
pub struct EnvelopeCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl EnvelopeCache {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl,
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// File an entry lives in, whether or not it exists yet.
    pub fn entry_path(&self, key: &CacheKey<'_>) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.digest()))
    }

    fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        // A file stamped in the future counts as brand new.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        age > self.ttl
    }

    /// Look up an entry against the current wall clock.
    pub fn get(&self, key: &CacheKey<'_>) -> Option<Envelope> {
        self.get_at(key, SystemTime::now())
    }

    /// Look up an entry as of `now`. Expired entries are deleted.
    pub fn get_at(&self, key: &CacheKey<'_>, now: SystemTime) -> Option<Envelope> {
        let path = self.entry_path(key);
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => {
                tracing::debug!(path = %path.display(), "cache miss");
                return None;
            }
        };

        if self.is_expired(modified, now) {
            tracing::debug!(path = %path.display(), "cache entry expired");
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove expired cache entry");
            }
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry");
                return None;
            }
        };
        match serde_json::from_str::<Envelope>(&content) {
            Ok(envelope) => {
                tracing::debug!(path = %path.display(), "cache hit");
                Some(envelope)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry");
                None
            }
        }
    }

    /// Store an entry. Never fails; problems are logged.
    pub fn set(&self, key: &CacheKey<'_>, envelope: &Envelope) {
        if let Err(e) = self.try_set(key, envelope) {
            tracing::warn!(symbol = key.symbol, error = %e, "failed to write cache entry");
        }
    }

    fn try_set(&self, key: &CacheKey<'_>, envelope: &Envelope) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let json = serde_json::to_string_pretty(envelope)?;
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            e
        })
    }

    /// Entry files currently on disk, with their metadata. Orphaned `.json.tmp`
    /// files from interrupted writes are included so purges clear them.
    fn entries(&self) -> Vec<(PathBuf, fs::Metadata)> {
        let Ok(dir) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        dir.flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".json") || n.ends_with(".json.tmp"))
            })
            .filter_map(|path| fs::metadata(&path).ok().map(|meta| (path, meta)))
            .collect()
    }

    /// Count entries, expired entries and bytes on disk as of `now`.
    pub fn stats(&self, now: SystemTime) -> CacheStats {
        self.entries()
            .iter()
            .fold(CacheStats::default(), |mut stats, (_, meta)| {
                stats.entries += 1;
                stats.bytes += meta.len();
                if meta.modified().is_ok_and(|m| self.is_expired(m, now)) {
                    stats.expired += 1;
                }
                stats
            })
    }

    /// Delete every expired entry as of `now`. Returns the number removed.
    pub fn purge_expired(&self, now: SystemTime) -> usize {
        self.entries()
            .into_iter()
            .filter(|(_, meta)| meta.modified().is_ok_and(|m| self.is_expired(m, now)))
            .filter(|(path, _)| fs::remove_file(path).is_ok())
            .count()
    }
}
