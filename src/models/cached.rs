//! Cached upstream response
//!
//! The value the proxy stores in the cache for each request path.

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Header telling clients whether the response came from the cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Status, content type and body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Upstream HTTP status code
    pub status: u16,
    /// Upstream `Content-Type`, if any
    pub content_type: Option<String>,
    /// Raw response body
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
        }
    }

    // == Into HTTP Response ==
    /// Replays the upstream response, tagging it with `x-cache: HIT|MISS`.
    pub fn into_http_response(self, hit: bool) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();

        match self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            Some(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            None => {
                headers.remove(CONTENT_TYPE);
            }
        }

        let cache_status = if hit { "HIT" } else { "MISS" };
        headers.insert(X_CACHE, HeaderValue::from_static(cache_status));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_http_response_replays_status_and_type() {
        let cached = CachedResponse::new(201, Some("text/plain"), "created");
        let response = cached.into_http_response(true);

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[X_CACHE], "HIT");
    }

    #[test]
    fn test_into_http_response_without_content_type() {
        let response = CachedResponse::new(404, None, Vec::new()).into_http_response(false);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response.headers()[X_CACHE], "MISS");
    }

    #[test]
    fn test_invalid_status_becomes_bad_gateway() {
        let response = CachedResponse::new(42, None, "x").into_http_response(false);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
