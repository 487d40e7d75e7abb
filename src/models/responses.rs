//! Response DTOs for the feed API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::feed::{Row, TableData};
use crate::models::FieldSelection;

/// Response body of the feed endpoint
///
/// Fields left out by `_fields` are omitted from the JSON entirely.
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Row>>,
}

impl FeedResponse {
    pub fn new(title: String, table: TableData, selection: FieldSelection) -> Self {
        Self {
            title: selection.title.then_some(title),
            header: selection.headers.then_some(table.header),
            body: selection.rows.then_some(table.body),
        }
    }
}

/// Payload of a successful cache removal
#[derive(Debug, Clone, Serialize)]
pub struct RemoveCacheData {
    pub message: String,
    /// Number of cache entries deleted
    pub removed: usize,
}

/// Response body for `POST /sherv-challenge/v1/remove-cache`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveCacheResponse {
    pub success: bool,
    pub data: RemoveCacheData,
}

impl RemoveCacheResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            success: true,
            data: RemoveCacheData {
                message: "Cache removed.".to_string(),
                removed,
            },
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Entries removed by invalidation
    pub invalidations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            invalidations: stats.invalidations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
