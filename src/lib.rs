//! Caching Proxy - A reverse proxy that caches GET responses in memory
//!
//! Responses are kept in a bounded cache with a fixed TTL, a byte budget
//! and an entry budget, evicting least recently used entries under pressure.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheEngine;
pub use config::{CacheConfig, CacheOptions, Config};
pub use tasks::spawn_expiry_sweep;
