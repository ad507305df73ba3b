//! API Module
//!
//! HTTP handlers and routing for the caching proxy.
//!
//! # Endpoints
//! - `GET /__proxy/health` - Health check endpoint
//! - `GET /__proxy/stats` - Cache statistics
//! - `GET /*` - Served from the cache or forwarded upstream

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
