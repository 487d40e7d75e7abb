//! Feed Module
//!
//! Upstream access and the shaping of its payload into table data.

mod fetcher;
pub mod sanitize;
mod shaper;


pub use fetcher::{FetchResponse, HttpFetcher, RemoteFetcher};
pub use shaper::{feed_title, shape, Row, TableData, DATE_FORMAT};
