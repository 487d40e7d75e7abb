//! API Module
//!
//! HTTP handlers and routing for the feed proxy REST API.
//!
//! # Endpoints
//! - `GET /sherv-challenge/v1/strategy11-data` - Cached upstream feed
//! - `POST /sherv-challenge/v1/remove-cache` - Cache invalidation (admin)
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, API_NAMESPACE};
