//! Cache Entry Module
//!
//! Defines a stored payload together with its expiry time.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A serialized payload held by the cache store.
///
/// Every entry carries an expiry; `expires_at` is always write time plus
/// TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value (serialized JSON)
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl_seconds`.
    pub fn new_at(value: String, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now_ms`.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL entry is never readable.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry_is_write_time_plus_ttl() {
        let entry = CacheEntry::new_at("{}".to_string(), 3600, 1_000);

        assert_eq!(entry.expires_at, 1_000 + 3_600_000);
        assert!(!entry.is_expired_at(1_000));
    }

    #[test]
    fn test_entry_expiry_saturates() {
        let entry = CacheEntry::new_at("payload".to_string(), u64::MAX, 1_000);
        assert_eq!(entry.expires_at, u64::MAX);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new_at("payload".to_string(), 10, 0);

        assert!(!entry.is_expired_at(9_999));
        assert!(entry.is_expired_at(10_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(10_001));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new_at("payload".to_string(), 0, 5_000);
        assert!(entry.is_expired_at(5_000));
    }
}
