//! Administrative Actions
//!
//! Cache invalidation guarded by a shared admin token.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::error::{ProxyError, Result};
use crate::proxy::CACHE_PREFIX;

/// Credentials presented by a caller of an administrative action.
#[derive(Debug, Clone, Default)]
pub struct AdminCredentials {
    token: Option<String>,
}

impl AdminCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Reads `Authorization: Bearer <token>`; anything else is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Self { token }
    }
}

// == Cache Invalidator ==
/// Removes every cache entry written under [`CACHE_PREFIX`].
pub struct CacheInvalidator {
    cache: Arc<RwLock<CacheStore>>,
    admin_token: Option<String>,
}

impl CacheInvalidator {
    /// With no `admin_token` every caller is refused.
    pub fn new(cache: Arc<RwLock<CacheStore>>, admin_token: Option<String>) -> Self {
        Self { cache, admin_token }
    }

    /// Deletes all entries in the service namespace and returns how many
    /// were removed.
    ///
    /// Unauthorized callers get [`ProxyError::Forbidden`] and the cache is
    /// left untouched. An empty cache is not an error.
    pub async fn invalidate_all(&self, caller: &AdminCredentials) -> Result<usize> {
        if !self.is_authorized(caller) {
            warn!("Refused cache invalidation for unauthorized caller");
            return Err(ProxyError::Forbidden);
        }

        let removed = {
            let mut cache = self.cache.write().await;
            cache.delete_by_prefix(CACHE_PREFIX)
        };

        info!(removed, "Cache invalidated");
        Ok(removed)
    }

    fn is_authorized(&self, caller: &AdminCredentials) -> bool {
        match (&self.admin_token, &caller.token) {
            (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
