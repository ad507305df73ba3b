//! Cache Events Module
//!
//! Sink for engine events. The engine owns one sink, handed to it at
//! construction, instead of writing to a process-wide logger.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// TTL elapsed
    Expired,
    /// LRU victim under entry-count or byte pressure
    Capacity,
    /// Overwritten by a `put` on the same key
    Replaced,
    /// Explicit removal
    Removed,
    /// Stored blob no longer decodes as the requested type
    Undecodable,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Expired => "expired",
            Self::Capacity => "capacity",
            Self::Replaced => "replaced",
            Self::Removed => "removed",
            Self::Undecodable => "undecodable",
        };
        f.write_str(name)
    }
}

// == Cache Events ==
/// Receives notifications from the engine. Every method defaults to a no-op.
pub trait CacheEvents: Send {
    fn initialized(&self, _config: &CacheConfig) {}

    fn hit(&self, _key: &str) {}

    fn miss(&self, _key: &str) {}

    fn stored(&self, _key: &str, _cost: usize) {}

    fn evicted(&self, _key: &str, _reason: EvictionReason, _cost: usize) {}

    fn rejected(&self, _key: &str, _cost: usize, _max_bytes: usize) {}

    fn undecodable(&self, _key: &str, _error: &bincode::Error) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl CacheEvents for NoopEvents {}

// == Tracing Events ==
/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl CacheEvents for TracingEvents {
    fn initialized(&self, config: &CacheConfig) {
        info!(
            ttl_ms = config.ttl_ms,
            max_bytes = config.max_bytes,
            max_entries = config.max_entries,
            "initialized cache"
        );
    }

    fn hit(&self, key: &str) {
        debug!(key, "cache hit");
    }

    fn miss(&self, key: &str) {
        debug!(key, "cache miss");
    }

    fn stored(&self, key: &str, cost: usize) {
        debug!(key, cost, "cache entry stored");
    }

    fn evicted(&self, key: &str, reason: EvictionReason, cost: usize) {
        debug!(key, %reason, cost, "cache entry evicted");
    }

    fn rejected(&self, key: &str, cost: usize, max_bytes: usize) {
        error!(
            "cache entry for key {} of size {} would exceed the max size of {}",
            key, cost, max_bytes
        );
    }

    fn undecodable(&self, key: &str, error: &bincode::Error) {
        warn!(key, %error, "dropping cache entry that no longer decodes");
    }
}
