//! Models for the caching proxy
//!
//! The cached upstream response and the JSON bodies of the proxy's own
//! endpoints.

pub mod cached;
pub mod responses;

// Re-export commonly used types
pub use cached::{CachedResponse, X_CACHE};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
