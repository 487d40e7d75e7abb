//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Upstream feed queried on a cache miss.
pub const DEFAULT_UPSTREAM_URL: &str = "http://api.strategy11.com/wp-json/challenge/v1/1";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream feed URL
    pub upstream_url: String,
    /// TTL in seconds for the cached upstream payload
    pub cache_ttl: u64,
    /// Outbound request timeout in seconds
    pub request_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Bearer token required by administrative actions; None refuses everyone
    pub admin_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_URL` - Upstream feed URL (default: the Strategy11 challenge feed)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 3600)
    /// - `REQUEST_TIMEOUT` - Upstream timeout in seconds (default: 7)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ADMIN_TOKEN` - Token for cache invalidation (default: unset)
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable source. Unset, unparsable and zero
    /// timeout values fall back to the defaults.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            upstream_url: var("UPSTREAM_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
            cache_ttl: var("CACHE_TTL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl),
            request_timeout: var("REQUEST_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.request_timeout),
            server_port: var("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            admin_token: var("ADMIN_TOKEN").filter(|v| !v.is_empty()),
        }
    }

    /// Outbound request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            cache_ttl: 3600,
            request_timeout: 7,
            server_port: 3000,
            admin_token: None,
        }
    }
}
