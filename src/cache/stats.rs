//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

use crate::cache::events::EvictionReason;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Entries removed to make room under the entry or byte budget
    pub evictions: u64,
    /// Entries replaced by a `put` on the same key
    pub replacements: u64,
    /// Entries removed explicitly or because their blob could not be decoded
    pub removals: u64,
    /// `put` calls refused because the entry alone exceeds the byte budget
    pub rejections: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current aggregate cost of all entries in bytes
    pub total_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    // == Record Eviction ==
    /// Increments the counter matching why an entry left the cache.
    pub fn record_eviction(&mut self, reason: EvictionReason) {
        match reason {
            EvictionReason::Expired => self.expirations += 1,
            EvictionReason::Capacity => self.evictions += 1,
            EvictionReason::Replaced => self.replacements += 1,
            EvictionReason::Removed | EvictionReason::Undecodable => self.removals += 1,
        }
    }

    // == Update Occupancy ==
    pub fn set_occupancy(&mut self, entries: usize, bytes: usize) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}
