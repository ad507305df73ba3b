//! API Handlers
//!
//! The proxy handler serving GETs from the cache or the upstream, plus the
//! proxy's own health and stats endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, Uri},
    response::Response,
    Json,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::cache::CacheEngine;
use crate::config::Config;
use crate::error::{ConfigError, ProxyError};
use crate::models::{CachedResponse, HealthResponse, StatsResponse};
use crate::proxy::{DestinationResolver, Forwarder, HttpForwarder};

/// Cache engine shared between request handlers and the expiry sweep.
///
/// The engine does no locking of its own; this mutex is the single
/// exclusion region around every `get` and `put`.
pub type SharedCache = Arc<Mutex<CacheEngine>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
    pub resolver: Arc<dyn DestinationResolver>,
    pub forwarder: Arc<dyn Forwarder>,
}

impl AppState {
    /// Creates a new AppState from its collaborators.
    pub fn new(
        cache: CacheEngine,
        resolver: Arc<dyn DestinationResolver>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            resolver,
            forwarder,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails if the cache budgets are invalid or no destination is set.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let cache = CacheEngine::from_options(config.cache)?;
        let resolver: Arc<dyn DestinationResolver> = Arc::from(config.destination_resolver()?);
        let forwarder = Arc::new(HttpForwarder::new(std::time::Duration::from_secs(
            config.upstream_timeout,
        ))?);
        Ok(Self::new(cache, resolver, forwarder))
    }
}

/// Fallback handler for every proxied path.
///
/// Only GET is supported. The cache key is the full request path including
/// the query string. The cache lock is released while the upstream request
/// is in flight.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ProxyError> {
    if method != Method::GET {
        error!("Unsupported request method {}", method);
        return Err(ProxyError::MethodNotAllowed(method));
    }

    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned());

    let cached = state.cache.lock().await.get::<CachedResponse>(&key);
    if let Some(response) = cached {
        debug!(key, "serving cached response");
        return Ok(response.into_http_response(true));
    }

    let destination = state.resolver.destination_for_path(&key)?;
    info!("cache miss, forwarding the request on to: {}", destination);

    let response = state.forwarder.forward(destination).await?;

    if let Err(err) = state.cache.lock().await.put(key, &response) {
        debug!(%err, "serving response without caching it");
    }

    Ok(response.into_http_response(false))
}

/// Handler for GET /__proxy/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.lock().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /__proxy/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, NoopEvents};
    use crate::config::CacheConfig;
    use crate::proxy::{Destination, SingleDestinationResolver};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use reqwest::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upstream stand-in that echoes the requested URL.
    #[derive(Default)]
    struct EchoForwarder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Forwarder for EchoForwarder {
        async fn forward(&self, url: Url) -> Result<CachedResponse, ProxyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CachedResponse::new(200, Some("text/plain"), url.to_string()))
        }
    }

    fn test_state() -> (AppState, Arc<EchoForwarder>) {
        let engine = CacheEngine::new(
            CacheConfig::default(),
            Arc::new(ManualClock::new(0)),
            Box::new(NoopEvents),
        )
        .unwrap();
        let resolver = Arc::new(SingleDestinationResolver::new(&Destination::new(
            "http://upstream.test",
            8080,
        )));
        let forwarder = Arc::new(EchoForwarder::default());
        (AppState::new(engine, resolver, forwarder.clone()), forwarder)
    }

    #[tokio::test]
    async fn test_non_get_is_rejected() {
        let (state, forwarder) = test_state();

        let result = proxy_handler(State(state), Method::POST, Uri::from_static("/a")).await;

        assert!(matches!(result, Err(ProxyError::MethodNotAllowed(_))));
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_forwards_and_caches() {
        let (state, forwarder) = test_state();
        let uri = Uri::from_static("/test/path?v=1");

        let first = proxy_handler(State(state.clone()), Method::GET, uri.clone())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = proxy_handler(State(state.clone()), Method::GET, uri)
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);

        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
        assert!(state.cache.lock().await.contains("/test/path?v=1"));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (state, _) = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
