//! Upstream Forwarding
//!
//! Issues the GET request for a cache miss and captures the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Url};
use tracing::debug;

use crate::error::{ConfigError, ProxyError};
use crate::models::CachedResponse;

// == Forwarder ==
/// Fetches a response from an upstream URL.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, url: Url) -> Result<CachedResponse, ProxyError>;
}

// == HTTP Forwarder ==
/// Forwards with a shared, connection-pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, url: Url) -> Result<CachedResponse, ProxyError> {
        debug!(%url, "forwarding request upstream");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Upstream(format!("{}: {}", url, e)))?;

        debug!(%url, status, body_len = body.len(), "upstream responded");

        Ok(CachedResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
