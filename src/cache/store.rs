//! Cache Store Module
//!
//! HashMap-backed key/value store with per-entry TTL and lazy expiry.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH};
use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

// == Cache Store ==
/// Key/value storage with TTL support.
///
/// There is no capacity bound and no sweeper: stale entries are dropped by
/// the read that observes them.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lookup statistics
    stats: CacheStats,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value for `ttl` seconds, overwriting any previous value and
    /// resetting its expiry. Values are not size-limited.
    pub fn set(&mut self, key: String, value: String, ttl: u64) -> Result<()> {
        self.set_at(key, value, ttl, current_timestamp_ms())
    }

    /// Same as [`CacheStore::set`] with an explicit write time.
    pub fn set_at(&mut self, key: String, value: String, ttl: u64, now_ms: u64) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        self.entries
            .insert(key, CacheEntry::new_at(value, ttl, now_ms));
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and reported as `Expired`.
    pub fn get(&mut self, key: &str) -> Result<String> {
        self.get_at(key, current_timestamp_ms())
    }

    /// Same as [`CacheStore::get`] evaluated at `now_ms`.
    pub fn get_at(&mut self, key: &str, now_ms: u64) -> Result<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now_ms) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Ok(value);
            }
            Some(_) => true,
            None => false,
        };

        self.stats.record_miss();

        if expired {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
            Err(CacheError::Expired(key.to_string()))
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    // == Delete ==
    /// Removes an entry by key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.stats.set_total_entries(self.entries.len());
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    // == Delete By Prefix ==
    /// Removes every entry whose key starts with `prefix`, expired or not.
    ///
    /// Returns the number of entries removed.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();

        self.stats.record_invalidations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
