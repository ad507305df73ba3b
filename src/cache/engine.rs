//! Cache Engine Module
//!
//! Bounded in-memory cache enforcing a TTL, a byte budget and an entry
//! budget, evicting least recently used entries under pressure.
//!
//! The engine is single-writer. It does no locking of its own; callers
//! sharing it between tasks wrap it in one mutex (see [`crate::api::AppState`]).

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{
    CacheEvents, CacheStats, Clock, EntryStore, EvictionReason, ExpiryTracker, SizeAccountant,
    SystemClock, TracingEvents,
};
use crate::config::{CacheConfig, CacheOptions};
use crate::error::{CacheError, ConfigError, Result};

// == Cache Engine ==
/// TTL + byte budget + entry budget cache with LRU eviction.
pub struct CacheEngine {
    /// Serialized values in LRU order
    store: EntryStore,
    /// Expiry deadlines in insertion order
    expiry: ExpiryTracker,
    /// Aggregate cost of live entries
    sizes: SizeAccountant,
    stats: CacheStats,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    events: Box<dyn CacheEvents>,
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("config", &self.config)
            .field("len", &self.store.len())
            .field("current_bytes", &self.sizes.current())
            .field("stats", &self.stats)
            .finish()
    }
}

impl CacheEngine {
    // == Constructors ==
    /// Validates the options and builds an engine on the system clock that
    /// logs through `tracing`.
    pub fn from_options(options: CacheOptions) -> std::result::Result<Self, ConfigError> {
        Self::with_defaults(options.validate()?)
    }

    /// Builds an engine on the system clock that logs through `tracing`.
    pub fn with_defaults(config: CacheConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(config, Arc::new(SystemClock::new()), Box::new(TracingEvents))
    }

    /// Builds an engine from budgets, a clock and an event sink.
    ///
    /// Fails if any budget is zero.
    pub fn new(
        config: CacheConfig,
        clock: Arc<dyn Clock>,
        events: Box<dyn CacheEvents>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        events.initialized(&config);
        Ok(Self {
            store: EntryStore::new(),
            expiry: ExpiryTracker::new(),
            sizes: SizeAccountant::new(),
            stats: CacheStats::new(),
            config,
            clock,
            events,
        })
    }

    // == Get ==
    /// Returns an independent copy of the value stored under `key`.
    ///
    /// Expired entries are evicted and reported as absent. A hit makes the
    /// key the most recently used.
    pub fn get<V: DeserializeOwned>(&mut self, key: &str) -> Option<V> {
        let Some(blob) = self.store.get(key) else {
            self.record_miss(key);
            return None;
        };

        let now = self.clock.now_ms();
        let expired = self
            .expiry
            .expires_at(key)
            .map_or(true, |expires_at| is_expired(expires_at, now));
        if expired {
            self.evict(key, EvictionReason::Expired);
            self.record_miss(key);
            return None;
        }

        match bincode::deserialize::<V>(blob) {
            Ok(value) => {
                self.store.touch(key);
                self.stats.record_hit();
                self.events.hit(key);
                Some(value)
            }
            Err(error) => {
                self.events.undecodable(key, &error);
                self.evict(key, EvictionReason::Undecodable);
                self.record_miss(key);
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key` and hands the value back.
    ///
    /// Expired entries are reclaimed first, then least recently used entries
    /// until both the entry and byte budgets have room. An entry whose cost
    /// alone exceeds the byte budget is refused and the cache is left as is.
    pub fn put<V: Serialize>(&mut self, key: impl Into<String>, value: V) -> Result<V> {
        let key = key.into();
        let blob = bincode::serialize(&value)?;
        let cost = SizeAccountant::cost(&key, &blob);

        if cost > self.config.max_bytes {
            self.stats.record_rejection();
            self.events.rejected(&key, cost, self.config.max_bytes);
            return Err(CacheError::EntryTooLarge {
                key,
                size: cost,
                max: self.config.max_bytes,
            });
        }

        if self.store.contains(&key) {
            self.evict(&key, EvictionReason::Replaced);
        }
        self.evict_expired();
        self.evict_for_capacity(cost);

        let expires_at = self.clock.now_ms().saturating_add(self.config.ttl_ms);
        self.store.insert_tail(key.clone(), blob);
        self.expiry.record(key.clone(), expires_at);
        self.sizes.add(cost);
        self.events.stored(&key, cost);

        Ok(value)
    }

    // == Remove ==
    /// Drops `key` from the cache. Returns false if it was not cached.
    pub fn remove(&mut self, key: &str) -> bool {
        self.evict(key, EvictionReason::Removed).is_some()
    }

    // == Evict Expired ==
    /// Removes expired entries, oldest first, stopping at the first entry
    /// that is still valid. Returns the number of entries removed.
    pub fn evict_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        while let Some((key, expires_at)) = self.expiry.oldest() {
            if !is_expired(expires_at, now) {
                break;
            }
            let key = key.to_owned();
            self.evict(&key, EvictionReason::Expired);
            removed += 1;
        }

        removed
    }

    /// Evicts LRU entries until one entry of `cost` bytes fits.
    fn evict_for_capacity(&mut self, cost: usize) {
        while self.store.len() >= self.config.max_entries
            || self.sizes.current() + cost > self.config.max_bytes
        {
            let Some(victim) = self.store.peek_oldest_lru_key().map(str::to_owned) else {
                break;
            };
            self.evict(&victim, EvictionReason::Capacity);
        }
    }

    /// Removes `key` from the store, the expiry tracker and the size total.
    fn evict(&mut self, key: &str, reason: EvictionReason) -> Option<usize> {
        self.expiry.remove(key);
        let blob = self.store.remove(key)?;
        let cost = SizeAccountant::cost(key, &blob);
        self.sizes.subtract(cost);
        self.stats.record_eviction(reason);
        self.events.evicted(key, reason, cost);
        Some(cost)
    }

    fn record_miss(&mut self, key: &str) {
        self.stats.record_miss();
        self.events.miss(key);
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    /// Aggregate cost of all live entries in bytes.
    pub fn current_bytes(&self) -> usize {
        self.sizes.current()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.store.len(), self.sizes.current());
        stats
    }

    /// Keys from least to most recently used.
    pub fn keys_lru_order(&self) -> Vec<String> {
        self.store.keys_lru_order().map(str::to_owned).collect()
    }

    // == Invariants ==
    /// Verifies the bookkeeping against the stored entries.
    pub fn check_invariants(&self) -> Result<()> {
        let summed: usize = self
            .store
            .iter()
            .map(|(key, blob)| SizeAccountant::cost(key, blob))
            .sum();
        if summed != self.sizes.current() {
            return Err(CacheError::InvariantViolation(format!(
                "tracked {} bytes but entries cost {}",
                self.sizes.current(),
                summed
            )));
        }

        if self.store.len() > self.config.max_entries {
            return Err(CacheError::InvariantViolation(format!(
                "{} entries exceed the limit of {}",
                self.store.len(),
                self.config.max_entries
            )));
        }

        if self.sizes.current() > self.config.max_bytes {
            return Err(CacheError::InvariantViolation(format!(
                "{} bytes exceed the limit of {}",
                self.sizes.current(),
                self.config.max_bytes
            )));
        }

        if self.expiry.len() != self.store.len()
            || self.store.keys_lru_order().any(|key| self.expiry.expires_at(key).is_none())
        {
            return Err(CacheError::InvariantViolation(
                "store and expiry tracker hold different keys".to_string(),
            ));
        }

        let deadlines: Vec<u64> = self.expiry.iter().map(|(_, at)| at).collect();
        if deadlines.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(CacheError::InvariantViolation(
                "expiry deadlines are out of order".to_string(),
            ));
        }

        Ok(())
    }
}

/// An entry is expired once the clock reaches its deadline.
fn is_expired(expires_at: u64, now: u64) -> bool {
    now >= expires_at
}
