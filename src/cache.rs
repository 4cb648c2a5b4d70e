//! In-memory translation cache with TTL and a size cap
//!
//! Keys are `"{from}->{to}:{text}"`. Entries are never refreshed on reads:
//! eviction follows insertion order, not recency. When the table grows past
//! its cap, the oldest entries are dropped in one batch until only half the
//! cap remains.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default time an entry stays servable
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Build the cache key for a translation request
///
/// Order- and case-sensitive: `("hello", "en", "fr")` and
/// `("hello", "fr", "en")` map to different keys.
pub fn cache_key(text: &str, from_lang: &str, to_lang: &str) -> String {
    format!("{}->{}:{}", from_lang, to_lang, text)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    translation: String,
    created_at: Instant,
    /// Position in insertion order
    seq: u64,
}

/// Counters reported by `status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entries, {} hits, {} misses, {} evictions",
            self.entries, self.hits, self.misses, self.evictions
        )
    }
}

/// TTL- and size-bounded map from cache key to translation
///
/// Not internally synchronized; the owning client serializes access.
#[derive(Debug)]
pub struct TranslationCache {
    entries: HashMap<String, CacheEntry>,
    /// seq -> key, oldest first
    order: BTreeMap<u64, String>,
    next_seq: u64,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl TranslationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            ttl,
            max_entries,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a live translation
    ///
    /// Stale entries are reported as missing but stay in the table until the
    /// next [`sweep_expired`](Self::sweep_expired).
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                self.hits += 1;
                Some(entry.translation.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a translation, replacing any previous entry for `key`
    ///
    /// A replaced entry moves to the newest insertion position.
    pub fn insert(&mut self, key: String, translation: String) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(previous) = self.entries.get(&key) {
            self.order.remove(&previous.seq);
        }
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                translation,
                created_at: Instant::now(),
                seq,
            },
        );
    }

    /// Drop every entry whose age has reached the TTL
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        // Timestamps grow with seq, so expired entries form a prefix.
        let mut removed = 0;
        while let Some((&seq, key)) = self.order.first_key_value() {
            let expired = self
                .entries
                .get(key)
                .is_none_or(|entry| entry.created_at.elapsed() >= self.ttl);
            if !expired {
                break;
            }
            if let Some(key) = self.order.remove(&seq) {
                self.entries.remove(&key);
            }
            removed += 1;
        }

        if removed > 0 {
            self.evictions += removed as u64;
            debug!(removed, remaining = self.len(), "Swept expired cache entries");
        }
        removed
    }

    /// Trim the table to half its cap once it has grown past the cap
    ///
    /// Oldest insertions go first. Returns the number of entries removed.
    pub fn enforce_capacity(&mut self) -> usize {
        if self.entries.len() <= self.max_entries {
            return 0;
        }

        let to_remove = self.entries.len() - self.max_entries / 2;
        for _ in 0..to_remove {
            match self.order.pop_first() {
                Some((_, key)) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }

        self.evictions += to_remove as u64;
        debug!(
            removed = to_remove,
            remaining = self.len(),
            "Trimmed translation cache"
        );
        to_remove
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
