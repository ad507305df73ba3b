//! Destination Resolvers
//!
//! Map an incoming request path to the upstream URL it is forwarded to.

use std::collections::HashMap;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ResolveError;

/// Upstream host, e.g. `http://example.com` with port `8080`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Destination {
    /// Scheme and host
    pub host: String,
    /// Port appended to the host when present
    #[serde(default)]
    pub port: Option<u16>,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
        }
    }

    fn base(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Places `path` (with any query and fragment) on this destination's
    /// base URL. The host always stays this destination's host.
    fn join(&self, path: &str) -> Result<Url, ResolveError> {
        let base = self.base();
        let mut url = Url::parse(&base)
            .map_err(|e| ResolveError::InvalidUrl(format!("{}: {}", base, e)))?;
        if url.cannot_be_a_base() {
            return Err(ResolveError::InvalidUrl(base));
        }

        let (rest, fragment) = split_at_char(path, '#');
        let (resource, query) = split_at_char(rest, '?');
        url.set_path(resource);
        url.set_query(query);
        url.set_fragment(fragment);
        Ok(url)
    }
}

/// Splits `s` at the first `delimiter`, dropping the delimiter itself.
fn split_at_char(s: &str, delimiter: char) -> (&str, Option<&str>) {
    match s.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

// == Destination Resolver ==
/// Resolves request paths to upstream URLs.
pub trait DestinationResolver: Send + Sync {
    fn destination_for_path(&self, path: &str) -> Result<Url, ResolveError>;
}

// == Single Destination ==
/// Forwards every path to one upstream host.
#[derive(Debug, Clone)]
pub struct SingleDestinationResolver {
    destination: Destination,
}

impl SingleDestinationResolver {
    pub fn new(destination: &Destination) -> Self {
        Self {
            destination: destination.clone(),
        }
    }
}

impl DestinationResolver for SingleDestinationResolver {
    fn destination_for_path(&self, path: &str) -> Result<Url, ResolveError> {
        self.destination.join(path)
    }
}

// == Multiple Destinations ==
/// Routes on the first path segment: `/<route>/rest` goes to `rest` on the
/// host configured for `<route>`.
#[derive(Debug, Clone, Default)]
pub struct MultipleDestinationResolver {
    routes: HashMap<String, Destination>,
}

impl MultipleDestinationResolver {
    pub fn new(routes: HashMap<String, Destination>) -> Self {
        Self { routes }
    }
}

impl DestinationResolver for MultipleDestinationResolver {
    fn destination_for_path(&self, path: &str) -> Result<Url, ResolveError> {
        let (route, resource_path) = extract_path_info(path)?;
        let destination = self
            .routes
            .get(route)
            .ok_or_else(|| ResolveError::NotFound(route.to_string()))?;

        destination.join(resource_path.unwrap_or_default())
    }
}

// == Path Info ==
/// Splits a path into its route segment and the remaining resource path.
///
/// The route is the first non-empty run of characters after a `/`. The
/// resource path is everything after the route up to the first whitespace,
/// or `None` when nothing follows.
pub fn extract_path_info(path: &str) -> Result<(&str, Option<&str>), ResolveError> {
    for (slash, _) in path.match_indices('/') {
        let after = &path[slash + 1..];
        let route_len = after.find('/').unwrap_or(after.len());
        if route_len == 0 {
            continue;
        }

        let (route, rest) = after.split_at(route_len);
        let rest_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let resource_path = (rest_len > 0).then(|| &rest[..rest_len]);
        return Ok((route, resource_path));
    }

    Err(ResolveError::InvalidPath(path.to_string()))
}
