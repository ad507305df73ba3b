//! Cache Module
//!
//! Provides the bounded in-memory cache engine: TTL expiration, a byte
//! budget and an entry budget, with LRU eviction.

mod clock;
mod engine;
mod entry_store;
mod events;
mod expiry;
mod ordered;
mod size;
mod stats;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use engine::CacheEngine;
pub use entry_store::EntryStore;
pub use events::{CacheEvents, EvictionReason, NoopEvents, TracingEvents};
pub use expiry::ExpiryTracker;
pub use ordered::OrderedIndex;
pub use size::{SizeAccountant, EXPIRY_OVERHEAD_BYTES};
pub use stats::CacheStats;
