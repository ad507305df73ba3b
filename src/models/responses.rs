//! Response DTOs for the proxy's own endpoints
//!
//! Defines the JSON bodies of the health, stats and error responses.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /__proxy/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Entries evicted for space
    pub evictions: u64,
    /// Entries overwritten by a newer response
    pub replacements: u64,
    /// Entries dropped explicitly or because they could not be decoded
    pub removals: u64,
    /// Responses too large to cache
    pub rejections: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current aggregate entry cost in bytes
    pub total_bytes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            replacements: stats.replacements,
            removals: stats.removals,
            rejections: stats.rejections,
            total_entries: stats.total_entries,
            total_bytes: stats.total_bytes,
        }
    }
}

/// Response body for the health endpoint (GET /__proxy/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
