//! Configuration Module
//!
//! Handles loading and validating proxy and cache configuration from
//! environment variables or a TOML file.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::proxy::{
    Destination, DestinationResolver, MultipleDestinationResolver, SingleDestinationResolver,
};

// == Defaults ==
pub const DEFAULT_TTL_MS: i64 = 30 * 1000;
pub const DEFAULT_MAX_BYTES: i64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_ENTRIES: i64 = 50;

// == Cache Options ==
/// Unvalidated cache budgets.
///
/// `None` stands for an option that was given but unusable (for example a
/// non-numeric environment value). Options that are not given at all take
/// their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Expiration time in milliseconds for individual entries
    pub ttl_ms: Option<i64>,
    /// Maximum aggregate size of the cache in bytes
    pub max_bytes: Option<i64>,
    /// Maximum number of entries in the cache
    pub max_entries: Option<i64>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl_ms: Some(DEFAULT_TTL_MS),
            max_bytes: Some(DEFAULT_MAX_BYTES),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
        }
    }
}

impl CacheOptions {
    // == Validate ==
    /// Checks every budget is present and strictly positive.
    ///
    /// The error names every offending option, not just the first.
    pub fn validate(&self) -> Result<CacheConfig, ConfigError> {
        let positive = |value: Option<i64>| matches!(value, Some(v) if v > 0);
        reject_invalid([
            ("ttl_ms", positive(self.ttl_ms)),
            ("max_bytes", positive(self.max_bytes)),
            ("max_entries", positive(self.max_entries)),
        ])?;

        // All three are Some and positive past this point
        Ok(CacheConfig {
            ttl_ms: self.ttl_ms.unwrap_or_default() as u64,
            max_bytes: self.max_bytes.unwrap_or_default() as usize,
            max_entries: self.max_entries.unwrap_or_default() as usize,
        })
    }
}

// == Cache Config ==
/// Cache budgets in their working units.
///
/// Built by [`CacheOptions::validate`], and checked again by
/// [`CacheEngine::new`](crate::cache::CacheEngine::new) since the fields are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    pub max_bytes: usize,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS as u64,
            max_bytes: DEFAULT_MAX_BYTES as usize,
            max_entries: DEFAULT_MAX_ENTRIES as usize,
        }
    }
}

impl CacheConfig {
    /// Checks every budget is strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        reject_invalid([
            ("ttl_ms", self.ttl_ms > 0),
            ("max_bytes", self.max_bytes > 0),
            ("max_entries", self.max_entries > 0),
        ])
    }
}

/// Fails with every option whose check did not pass.
fn reject_invalid(checks: [(&'static str, bool); 3]) -> Result<(), ConfigError> {
    let invalid: Vec<&'static str> = checks
        .iter()
        .filter(|(_, valid)| !valid)
        .map(|(name, _)| *name)
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::InvalidOptions(invalid))
    }
}

// == Config ==
/// Proxy server configuration parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache budgets
    pub cache: CacheOptions,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Timeout for upstream requests in seconds
    pub upstream_timeout: u64,
    /// Single upstream host, used when no routes are configured
    pub destination: Option<Destination>,
    /// Route name to upstream host, selected by the first path segment
    pub routes: HashMap<String, Destination>,
    /// TOML file holding a `[routes]` table
    pub destinations_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            server_port: 9999,
            cleanup_interval: 5,
            upstream_timeout: 10,
            destination: None,
            routes: HashMap::new(),
            destinations_file: None,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 30000)
    /// - `CACHE_MAX_BYTES` - Byte budget (default: 10 MiB)
    /// - `CACHE_MAX_ENTRIES` - Entry budget (default: 50)
    /// - `SERVER_PORT` - HTTP server port (default: 9999)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 5)
    /// - `UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 10)
    /// - `DESTINATION_HOST` / `DESTINATION_PORT` - Single upstream host
    /// - `DESTINATIONS_FILE` - TOML route map for multi-host routing
    ///
    /// Fails if `DESTINATION_PORT` is set but is not a valid port.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cache_defaults = CacheOptions::default();

        let destination = match env::var("DESTINATION_HOST") {
            Ok(host) => Some(Destination {
                host,
                port: port_from_env("DESTINATION_PORT")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            cache: CacheOptions {
                ttl_ms: budget_from_env("CACHE_TTL_MS", cache_defaults.ttl_ms),
                max_bytes: budget_from_env("CACHE_MAX_BYTES", cache_defaults.max_bytes),
                max_entries: budget_from_env("CACHE_MAX_ENTRIES", cache_defaults.max_entries),
            },
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            upstream_timeout: env::var("UPSTREAM_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout),
            destination,
            routes: HashMap::new(),
            destinations_file: env::var("DESTINATIONS_FILE").ok().map(PathBuf::from),
        })
    }

    /// Loads configuration from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path.as_ref())
    }

    // == Destination Resolver ==
    /// Builds the resolver for the configured routing mode.
    ///
    /// Route maps (inline or from `destinations_file`) take precedence over a
    /// single destination.
    pub fn destination_resolver(&self) -> Result<Box<dyn DestinationResolver>, ConfigError> {
        let mut routes = self.routes.clone();
        if let Some(path) = &self.destinations_file {
            routes.extend(RouteFile::load(path)?.routes);
        }

        if !routes.is_empty() {
            return Ok(Box::new(MultipleDestinationResolver::new(routes)));
        }

        match &self.destination {
            Some(destination) => Ok(Box::new(SingleDestinationResolver::new(destination))),
            None => Err(ConfigError::MissingDestination),
        }
    }
}

/// `[routes]` table of a destinations file.
#[derive(Debug, Default, Deserialize)]
struct RouteFile {
    #[serde(default)]
    routes: HashMap<String, Destination>,
}

impl RouteFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Unset keeps the default; set but non-numeric becomes `None` (invalid).
fn budget_from_env(name: &str, default: Option<i64>) -> Option<i64> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().ok(),
        Err(_) => default,
    }
}

/// Unset means no port; set but not a port number is an error.
fn port_from_env(name: &'static str) -> Result<Option<u16>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidPort { name, value: raw }),
        Err(_) => Ok(None),
    }
}
