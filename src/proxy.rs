//! Feed Proxy
//!
//! Cache-through access to the upstream feed: lookup, fetch on miss, shape,
//! write back.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::feed::{feed_title, shape, RemoteFetcher, TableData};

/// Namespace shared by every cache key this service writes.
pub const CACHE_PREFIX: &str = "sherv_challenge_";

/// Prefix of the upstream feed entry.
pub const FEED_CACHE_PREFIX: &str = "sherv_challenge_strategy11_data_";

/// Cache key for an upstream URL.
///
/// Trailing slashes do not change the key.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(normalize_url(url).as_bytes());
    format!("{}{}", FEED_CACHE_PREFIX, hex::encode(digest))
}

fn normalize_url(url: &str) -> &str {
    url.trim_end_matches(|c: char| c == '/' || c == '\\')
}

/// Where a served table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Upstream,
}

/// A shaped feed ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyOutcome {
    pub title: String,
    pub table: TableData,
    pub source: FetchSource,
}

/// Settings the proxy reads on every request.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub upstream_url: String,
    pub cache_ttl: u64,
    pub request_timeout: Duration,
}

impl From<&Config> for ProxySettings {
    fn from(config: &Config) -> Self {
        Self {
            upstream_url: config.upstream_url.clone(),
            cache_ttl: config.cache_ttl,
            request_timeout: config.timeout(),
        }
    }
}

// == Feed Proxy ==
/// Serves the upstream feed through the shared cache.
///
/// The cache holds the raw upstream JSON, not the shaped table, so every hit
/// is re-shaped with the current rules.
pub struct FeedProxy {
    cache: Arc<RwLock<CacheStore>>,
    fetcher: Arc<dyn RemoteFetcher>,
    settings: ProxySettings,
}

impl FeedProxy {
    pub fn new(
        cache: Arc<RwLock<CacheStore>>,
        fetcher: Arc<dyn RemoteFetcher>,
        settings: ProxySettings,
    ) -> Self {
        Self {
            cache,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    // == Get Feed ==
    /// Returns the shaped feed, from cache when possible.
    ///
    /// Failures never touch the cache; a successful miss writes exactly once.
    pub async fn get_feed(&self) -> Result<ProxyOutcome> {
        let url = normalize_url(&self.settings.upstream_url);
        let key = cache_key(url);

        if let Some(raw) = self.read_cached(&key).await {
            debug!(key = %key, "Feed cache hit");
            let table = shape(&raw).map_err(|e| {
                warn!(key = %key, error = %e, "Cached feed no longer shapes");
                ProxyError::MalformedCache(e.to_string())
            })?;

            return Ok(ProxyOutcome {
                title: feed_title(&raw),
                table,
                source: FetchSource::Cache,
            });
        }

        debug!(key = %key, url, "Feed cache miss, fetching upstream");
        let raw = self.fetch_upstream(url).await?;

        let table = shape(&raw).map_err(|e| {
            warn!(url, error = %e, "Upstream feed has an unexpected shape");
            ProxyError::InvalidStory
        })?;

        self.write_cache(key, &raw).await;

        info!(url, rows = table.body.len(), "Served feed from upstream");
        Ok(ProxyOutcome {
            title: feed_title(&raw),
            table,
            source: FetchSource::Upstream,
        })
    }

    /// Cached raw payload, if present and usable.
    ///
    /// Store errors, undecodable and falsy values all read as a miss.
    async fn read_cached(&self, key: &str) -> Option<Value> {
        let cached = {
            let mut cache = self.cache.write().await;
            cache.get(key)
        };

        let text = match cached {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => return None,
            Err(e) => {
                debug!(key, reason = %e, "Feed not cached");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(raw) if is_truthy(&raw) => Some(raw),
            _ => {
                warn!(key, "Ignoring unreadable cached feed");
                None
            }
        }
    }

    async fn fetch_upstream(&self, url: &str) -> Result<Value> {
        let response = self
            .fetcher
            .fetch(url, self.settings.request_timeout)
            .await
            .map_err(|e| {
                warn!(url, error = %e, "Upstream request failed");
                ProxyError::InvalidUrl
            })?;

        if !response.is_ok() {
            warn!(url, status = response.status, "Upstream answered with an error status");
            return Err(ProxyError::InvalidUrl);
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(raw) if is_truthy(&raw) => Ok(raw),
            _ => {
                warn!(url, "Upstream body is empty or not JSON");
                Err(ProxyError::InvalidStory)
            }
        }
    }

    async fn write_cache(&self, key: String, raw: &Value) {
        let value = raw.to_string();
        let mut cache = self.cache.write().await;

        // A rejected write only costs the next request a refetch
        if let Err(e) = cache.set(key, value, self.settings.cache_ttl) {
            warn!(error = %e, "Could not cache upstream feed");
        }
    }
}

/// Whether a decoded payload counts as data at all.
///
/// `null`, `false`, zero, `""`, `"0"` and empty arrays or objects do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::feed::FetchResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays queued responses, counts calls and records the timeout of
    /// each one.
    struct ScriptedFetcher {
        responses: Mutex<Vec<std::result::Result<FetchResponse, FetchError>>>,
        calls: AtomicUsize,
        timeouts: Mutex<Vec<Duration>>,
    }

    impl ScriptedFetcher {
        fn new(mut responses: Vec<std::result::Result<FetchResponse, FetchError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                timeouts: Mutex::new(Vec::new()),
            }
        }

        fn timeouts(&self) -> Vec<Duration> {
            self.timeouts.lock().unwrap().clone()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteFetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            _url: &str,
            timeout: Duration,
        ) -> std::result::Result<FetchResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.timeouts.lock().unwrap().push(timeout);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(FetchError::Network("no scripted response".to_string())))
        }
    }

    fn ok(body: &str) -> std::result::Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn status(code: u16) -> std::result::Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            status: code,
            body: String::new(),
        })
    }

    const PAYLOAD: &str = r#"{"title":"X","data":{"headers":["ID","First Name"],"rows":[{"id":"7","fname":"Ann","date":1700000000}]}}"#;

    fn proxy_with(fetcher: Arc<ScriptedFetcher>) -> (FeedProxy, Arc<RwLock<CacheStore>>) {
        let cache = Arc::new(RwLock::new(CacheStore::new()));
        let settings = ProxySettings::from(&Config::default());
        (FeedProxy::new(cache.clone(), fetcher, settings), cache)
    }

    #[test]
    fn test_cache_key_is_stable_and_prefixed() {
        let key = cache_key("http://example.com/feed");

        assert!(key.starts_with(FEED_CACHE_PREFIX));
        assert!(key.starts_with(CACHE_PREFIX));
        assert_eq!(key.len(), FEED_CACHE_PREFIX.len() + 64);
        assert_eq!(key, cache_key("http://example.com/feed/"));
        assert_ne!(key, cache_key("http://example.com/other"));
    }

    #[test]
    fn test_is_truthy() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{} should be falsy", falsy);
        }
        for truthy in [json!(true), json!(1), json!("a"), json!([0]), json!({"a": null})] {
            assert!(is_truthy(&truthy), "{} should be truthy", truthy);
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_shapes_and_caches() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(PAYLOAD)]));
        let (proxy, cache) = proxy_with(fetcher.clone());

        let outcome = proxy.get_feed().await.unwrap();

        assert_eq!(outcome.source, FetchSource::Upstream);
        assert_eq!(outcome.title, "X");
        assert_eq!(outcome.table.body[0].date, "14/11/2023");
        assert_eq!(fetcher.calls(), 1);

        let key = cache_key(&Config::default().upstream_url);
        let cached = cache.write().await.get(&key).unwrap();
        let cached: Value = serde_json::from_str(&cached).unwrap();
        let expected: Value = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(cached, expected, "raw payload is cached, not the table");
    }

    #[tokio::test]
    async fn test_hit_does_not_fetch_again() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(PAYLOAD)]));
        let (proxy, _cache) = proxy_with(fetcher.clone());

        let first = proxy.get_feed().await.unwrap();
        let second = proxy.get_feed().await.unwrap();

        assert_eq!(second.source, FetchSource::Cache);
        assert_eq!(first.table, second.table);
        assert_eq!(first.title, second.title);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_invalid_url_and_not_cached() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![status(500), ok(PAYLOAD)]));
        let (proxy, cache) = proxy_with(fetcher.clone());

        let err = proxy.get_feed().await.unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUrl));
        assert!(cache.read().await.is_empty());

        // The retry goes upstream again
        let outcome = proxy.get_feed().await.unwrap();
        assert_eq!(outcome.source, FetchSource::Upstream);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_are_invalid_url() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Err(FetchError::Timeout("7s".to_string())),
            Err(FetchError::Network("refused".to_string())),
        ]));
        let (proxy, cache) = proxy_with(fetcher);

        assert!(matches!(proxy.get_feed().await, Err(ProxyError::InvalidUrl)));
        assert!(matches!(proxy.get_feed().await, Err(ProxyError::InvalidUrl)));
        assert!(cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unusable_body_is_invalid_story() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            ok("not json"),
            ok("null"),
            ok("[]"),
            ok(""),
        ]));
        let (proxy, cache) = proxy_with(fetcher);

        for _ in 0..4 {
            assert!(matches!(proxy.get_feed().await, Err(ProxyError::InvalidStory)));
        }
        assert!(cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_not_cached() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(
            r#"{"title":"X","data":{"headers":["ID"]}}"#,
        )]));
        let (proxy, cache) = proxy_with(fetcher);

        assert!(matches!(proxy.get_feed().await, Err(ProxyError::InvalidStory)));
        assert!(cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_cached_payload_is_server_error() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let (proxy, cache) = proxy_with(fetcher.clone());
        let key = cache_key(&proxy.settings().upstream_url);

        cache
            .write()
            .await
            .set(key, r#"{"title":"X"}"#.to_string(), 3600)
            .unwrap();

        let err = proxy.get_feed().await.unwrap_err();
        assert!(matches!(err, ProxyError::MalformedCache(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_cache_value_falls_back_to_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(PAYLOAD)]));
        let (proxy, cache) = proxy_with(fetcher.clone());
        let key = cache_key(&proxy.settings().upstream_url);

        cache
            .write()
            .await
            .set(key, "{not json".to_string(), 3600)
            .unwrap();

        let outcome = proxy.get_feed().await.unwrap();
        assert_eq!(outcome.source, FetchSource::Upstream);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_uses_configured_timeout() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(PAYLOAD)]));
        let (proxy, _cache) = proxy_with(fetcher.clone());

        proxy.get_feed().await.unwrap();
        assert_eq!(fetcher.timeouts(), vec![Duration::from_secs(7)]);

        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(PAYLOAD)]));
        let config = Config {
            request_timeout: 2,
            ..Config::default()
        };
        let proxy = FeedProxy::new(
            Arc::new(RwLock::new(CacheStore::new())),
            fetcher.clone(),
            ProxySettings::from(&config),
        );

        proxy.get_feed().await.unwrap();
        assert_eq!(fetcher.timeouts(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_large_payload_is_cached_and_replayed() {
        let rows: Vec<Value> = (0..100_000)
            .map(|id| {
                json!({
                    "id": id,
                    "fname": "Firstname",
                    "lname": "Lastname",
                    "email": format!("applicant{}@example.com", id),
                    "date": 1700000000
                })
            })
            .collect();
        let payload = json!({"title": "Big", "data": {"headers": ["ID"], "rows": rows}});
        let body = payload.to_string();
        assert!(body.len() > 8 * 1024 * 1024);

        let fetcher = Arc::new(ScriptedFetcher::new(vec![ok(&body)]));
        let (proxy, cache) = proxy_with(fetcher.clone());

        let first = proxy.get_feed().await.unwrap();
        assert_eq!(cache.read().await.len(), 1);

        let second = proxy.get_feed().await.unwrap();
        assert_eq!(second.source, FetchSource::Cache);
        assert_eq!(second.table.body.len(), 100_000);
        assert_eq!(first.table, second.table);
        assert_eq!(fetcher.calls(), 1);
    }
}
