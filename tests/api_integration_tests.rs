//! Integration Tests for the Proxy Router
//!
//! Drives the full request/response cycle through the router with a stub
//! upstream, so no network access is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use caching_proxy::{
    api::create_router,
    cache::{CacheEngine, ManualClock, NoopEvents},
    config::CacheConfig,
    error::ProxyError,
    models::{CachedResponse, X_CACHE},
    proxy::{
        Destination, DestinationResolver, Forwarder, MultipleDestinationResolver,
        SingleDestinationResolver,
    },
    AppState,
};
use reqwest::Url;
use serde_json::Value;
use tower::ServiceExt;

// == Helper Types ==

/// Upstream stand-in: echoes the URL it was asked for, or fails on demand.
#[derive(Default)]
struct StubUpstream {
    calls: AtomicUsize,
    body_size: Option<usize>,
    fail: bool,
}

impl StubUpstream {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forwarder for StubUpstream {
    async fn forward(&self, url: Url) -> Result<CachedResponse, ProxyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProxyError::Upstream(format!("{}: connection refused", url)));
        }
        let body = match self.body_size {
            Some(n) => "1".repeat(n),
            None => url.to_string(),
        };
        Ok(CachedResponse::new(200, Some("text/plain"), body))
    }
}

struct TestApp {
    router: Router,
    upstream: Arc<StubUpstream>,
    clock: Arc<ManualClock>,
}

fn cache_config() -> CacheConfig {
    CacheConfig {
        ttl_ms: 30_000,
        max_bytes: 1024,
        max_entries: 5,
    }
}

fn build_app(resolver: Arc<dyn DestinationResolver>, upstream: StubUpstream) -> TestApp {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let engine = CacheEngine::new(cache_config(), clock.clone(), Box::new(NoopEvents)).unwrap();
    let upstream = Arc::new(upstream);
    let state = AppState::new(engine, resolver, upstream.clone());

    TestApp {
        router: create_router(state),
        upstream,
        clock,
    }
}

fn single_app(upstream: StubUpstream) -> TestApp {
    let resolver = Arc::new(SingleDestinationResolver::new(&Destination::new(
        "http://example.com",
        8080,
    )));
    build_app(resolver, upstream)
}

fn multi_app() -> TestApp {
    let mut routes = HashMap::new();
    routes.insert(
        "test-route-1".to_string(),
        Destination::new("http://example.com", 8080),
    );
    build_app(
        Arc::new(MultipleDestinationResolver::new(routes)),
        StubUpstream::default(),
    )
}

async fn send(app: &TestApp, method: &str, uri: &str) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

// == Proxying ==

#[tokio::test]
async fn test_miss_then_hit() {
    let app = single_app(StubUpstream::default());

    let first = send(&app, "GET", "/test/1/?v=true").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[X_CACHE], "MISS");
    assert_eq!(first.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(
        body_string(first).await,
        "http://example.com:8080/test/1/?v=true"
    );

    let second = send(&app, "GET", "/test/1/?v=true").await;
    assert_eq!(second.headers()[X_CACHE], "HIT");
    assert_eq!(
        body_string(second).await,
        "http://example.com:8080/test/1/?v=true"
    );

    assert_eq!(app.upstream.calls(), 1);
}

#[tokio::test]
async fn test_query_string_is_part_of_the_key() {
    let app = single_app(StubUpstream::default());

    send(&app, "GET", "/items?page=1").await;
    let other = send(&app, "GET", "/items?page=2").await;

    assert_eq!(other.headers()[X_CACHE], "MISS");
    assert_eq!(app.upstream.calls(), 2);
}

#[tokio::test]
async fn test_expired_response_is_fetched_again() {
    let app = single_app(StubUpstream::default());

    send(&app, "GET", "/page").await;
    app.clock.advance(Duration::from_secs(35));
    let response = send(&app, "GET", "/page").await;

    assert_eq!(response.headers()[X_CACHE], "MISS");
    assert_eq!(app.upstream.calls(), 2);
}

#[tokio::test]
async fn test_oversized_response_is_served_but_not_cached() {
    let app = single_app(StubUpstream {
        body_size: Some(2000),
        ..StubUpstream::default()
    });

    let first = send(&app, "GET", "/big").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_string(first).await.len(), 2000);

    let second = send(&app, "GET", "/big").await;
    assert_eq!(second.headers()[X_CACHE], "MISS");
    assert_eq!(app.upstream.calls(), 2);
}

#[tokio::test]
async fn test_non_get_returns_405() {
    let app = single_app(StubUpstream::default());

    let response = send(&app, "POST", "/test/path").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(body_json(response).await.get("error").is_some());
    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn test_upstream_failure_returns_502() {
    let app = single_app(StubUpstream {
        fail: true,
        ..StubUpstream::default()
    });

    let response = send(&app, "GET", "/down").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
}

// == Multi-host Routing ==

#[tokio::test]
async fn test_route_prefix_is_stripped() {
    let app = multi_app();

    let response = send(&app, "GET", "/test-route-1/test/1/?v=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "http://example.com:8080/test/1/?v=true"
    );
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = multi_app();

    let response = send(&app, "GET", "/not/a/configured_route").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No destination host configured for not");
    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn test_root_path_returns_400() {
    let app = multi_app();

    let response = send(&app, "GET", "/").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Proxy Endpoints ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = single_app(StubUpstream::default());

    let response = send(&app, "GET", "/__proxy/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = single_app(StubUpstream::default());

    send(&app, "GET", "/a").await;
    send(&app, "GET", "/a").await;

    let response = send(&app, "GET", "/__proxy/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_entry_budget_is_enforced_through_the_proxy() {
    let app = single_app(StubUpstream::default());

    for i in 1..=6 {
        send(&app, "GET", &format!("/{}", i)).await;
    }

    let stats = body_json(send(&app, "GET", "/__proxy/stats").await).await;
    assert_eq!(stats["total_entries"], 5);
    assert_eq!(stats["evictions"], 1);

    // "/1" was the least recently used and had to be fetched again
    let response = send(&app, "GET", "/1").await;
    assert_eq!(response.headers()[X_CACHE], "MISS");
}
