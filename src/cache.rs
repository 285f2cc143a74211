//! Time-bounded memoization for store and filesystem lookups
//!
//! Entries are keyed by the operation that produced them plus its argument
//! (a file or tag name). The cache holds no correctness logic: a miss means
//! the caller recomputes from the store or the filesystem and puts the
//! result back. Mutations must call [`LookupCache::invalidate`] instead of
//! waiting for entries to expire.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::store::TagCount;

/// Default time-to-live for cached lookups
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Operation whose result is cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOp {
    /// Resolved path for a file name
    FilePath,
    /// Tag list (with counts) for a file name
    FileTags,
    /// File count for a tag name
    TagFileCount,
}

impl std::fmt::Display for CacheOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOp::FilePath => write!(f, "file_path"),
            CacheOp::FileTags => write!(f, "file_tags"),
            CacheOp::TagFileCount => write!(f, "tag_file_count"),
        }
    }
}

/// A cached result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Path(PathBuf),
    Tags(Vec<TagCount>),
    Count(i64),
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
}

/// Thread-safe lookup cache with per-entry expiry and point invalidation
#[derive(Debug)]
pub struct LookupCache {
    entries: RwLock<HashMap<(CacheOp, String), CacheEntry>>,
    default_ttl: Duration,
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl LookupCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// TTL used by [`LookupCache::put_default`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Fetch a live entry; expired entries count as a miss and are evicted
    pub fn get(&self, op: CacheOp, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let cache_key = (op, key.to_string());
        {
            let guard = self.entries.read().unwrap_or_else(|p| p.into_inner());
            match guard.get(&cache_key) {
                Some(entry) if entry.expires_at > now => {
                    tracing::trace!(%op, key, "Cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    tracing::trace!(%op, key, "Cache miss");
                    return None;
                }
            }
        }
        // Expired: evict unless a writer refreshed it in the meantime
        let mut guard = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if let Some(entry) = guard.get(&cache_key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
            guard.remove(&cache_key);
        }
        tracing::trace!(%op, key, "Cache entry expired");
        None
    }

    /// Store a value for `ttl`
    pub fn put(&self, op: CacheOp, key: &str, value: CachedValue, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert((op, key.to_string()), entry);
    }

    /// Store a value with the cache's default TTL
    pub fn put_default(&self, op: CacheOp, key: &str, value: CachedValue) {
        self.put(op, key, value, self.default_ttl);
    }

    /// Drop one entry regardless of expiry; returns whether it was present
    pub fn invalidate(&self, op: CacheOp, key: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&(op, key.to_string()))
            .is_some();
        if removed {
            tracing::trace!(%op, key, "Cache entry invalidated");
        }
        removed
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
