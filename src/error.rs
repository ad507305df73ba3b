//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors returned by the cache engine.
///
/// A miss or an expired entry is not an error; `get` reports both as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A single entry costs more than the whole byte budget
    #[error("cache entry for key {key} of size {size} would exceed the max size of {max}")]
    EntryTooLarge { key: String, size: usize, max: usize },

    /// The value could not be encoded into a blob
    #[error("failed to serialize cache value: {0}")]
    Serialization(#[from] bincode::Error),

    /// Internal bookkeeping disagrees with the stored entries
    #[error("cache accounting invariant violated: {0}")]
    InvariantViolation(String),
}

// == Config Error Enum ==
/// Errors raised while building configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more cache budgets are missing, non-numeric or not positive
    #[error("{} cannot be missing and must be > 0", .0.join(", "))]
    InvalidOptions(Vec<&'static str>),

    /// A port variable is set but is not a port number
    #[error("{name} must be a port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },

    /// The upstream HTTP client could not be built
    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// No upstream destination configured
    #[error("no destination configured: set DESTINATION_HOST or DESTINATIONS_FILE")]
    MissingDestination,

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected layout
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

// == Resolve Error Enum ==
/// Outcomes of destination resolution that do not yield an upstream URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The route segment has no configured destination
    #[error("No destination host configured for {0}")]
    NotFound(String),

    /// The path carries no route segment
    #[error("Invalid destination specified by path {0}")]
    InvalidPath(String),

    /// The configured host/port or joined path is not a valid URL
    #[error("Invalid destination url {0}")]
    InvalidUrl(String),
}

// == Proxy Error Enum ==
/// Errors surfaced to HTTP clients by the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Only GET is proxied
    #[error("Unsupported request method {0}")]
    MethodNotAllowed(Method),

    /// Destination could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Upstream request failed
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Resolve(ResolveError::NotFound(_)) => StatusCode::NOT_FOUND,
            ProxyError::Resolve(ResolveError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Resolve(ResolveError::InvalidUrl(_)) => StatusCode::BAD_GATEWAY,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
