//! Sherv Challenge - cached proxy for the Strategy11 challenge feed
//!
//! Fetches the upstream applicant table on a cache miss, keeps the raw
//! payload in a TTL cache and serves it as a sanitized `{header, body}` table.

pub mod admin;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod proxy;

pub use api::AppState;
pub use config::Config;
pub use proxy::FeedProxy;
