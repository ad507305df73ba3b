//! Expiry Tracker Module
//!
//! Tracks absolute expiry timestamps in insertion order.
//!
//! The cache uses one TTL for every entry, so insertion order is also
//! expiry order and the oldest entry is always at the front. Supporting
//! per-entry TTLs would require replacing this with a min-heap.

use crate::cache::ordered::OrderedIndex;

// == Expiry Tracker ==
/// FIFO of `(key, expires_at_ms)` pairs, non-decreasing by expiry.
#[derive(Debug, Default)]
pub struct ExpiryTracker {
    deadlines: OrderedIndex<u64>,
}

impl ExpiryTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            deadlines: OrderedIndex::new(),
        }
    }

    // == Record ==
    /// Appends a key with its absolute expiry time (Unix milliseconds).
    pub fn record(&mut self, key: String, expires_at: u64) {
        debug_assert!(
            self.deadlines
                .back()
                .map_or(true, |(_, &last)| last <= expires_at),
            "expiry tracker requires non-decreasing deadlines"
        );
        self.deadlines.push_back(key, expires_at);
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.deadlines.remove(key)
    }

    // == Oldest ==
    /// Returns the entry that expires first.
    pub fn oldest(&self) -> Option<(&str, u64)> {
        self.deadlines.front().map(|(key, &at)| (key, at))
    }

    pub fn expires_at(&self, key: &str) -> Option<u64> {
        self.deadlines.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Iterates `(key, expires_at)` oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.deadlines.iter().map(|(key, &at)| (key, at))
    }
}
