//! API Handlers
//!
//! HTTP request handlers for the feed proxy endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use tokio::sync::RwLock;

use crate::admin::{AdminCredentials, CacheInvalidator};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::feed::{HttpFetcher, RemoteFetcher};
use crate::models::{FeedQuery, FeedResponse, HealthResponse, RemoveCacheResponse, StatsResponse};
use crate::proxy::{FeedProxy, ProxySettings};

/// Application state shared across all handlers.
///
/// One cache store is shared by the proxy and the invalidator.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
    pub proxy: Arc<FeedProxy>,
    pub invalidator: Arc<CacheInvalidator>,
}

impl AppState {
    /// Wires the state around an existing store and fetcher.
    pub fn new(cache: CacheStore, fetcher: Arc<dyn RemoteFetcher>, config: &Config) -> Self {
        let cache = Arc::new(RwLock::new(cache));
        let proxy = FeedProxy::new(cache.clone(), fetcher, ProxySettings::from(config));
        let invalidator = CacheInvalidator::new(cache.clone(), config.admin_token.clone());

        Self {
            cache,
            proxy: Arc::new(proxy),
            invalidator: Arc::new(invalidator),
        }
    }

    /// Creates the production state: empty store, reqwest fetcher.
    pub fn from_config(config: &Config) -> std::result::Result<Self, FetchError> {
        let fetcher = HttpFetcher::new()?;
        Ok(Self::new(CacheStore::new(), Arc::new(fetcher), config))
    }
}

/// Handler for GET /sherv-challenge/v1/strategy11-data
///
/// Serves the shaped feed through the cache.
pub async fn feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let outcome = state.proxy.get_feed().await?;

    Ok(Json(FeedResponse::new(
        outcome.title,
        outcome.table,
        query.selection(),
    )))
}

/// Handler for POST /sherv-challenge/v1/remove-cache
///
/// Requires `Authorization: Bearer <ADMIN_TOKEN>`.
pub async fn remove_cache_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RemoveCacheResponse>> {
    let caller = AdminCredentials::from_headers(&headers);
    let removed = state.invalidator.invalidate_all(&caller).await?;

    Ok(Json(RemoveCacheResponse::new(removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
