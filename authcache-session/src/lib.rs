//! # Authcache Session
//!
//! Storage backends for per-session login status. Each session is one hash record
//! keyed by its token, with at least a `status` field.
//!
//! - [`MemoryStatusCache`]: process-local store, used for tests and single-process setups.
//! - `RedisStatusCache`: Redis-backed store (requires the `store-redis` feature).

use async_trait::async_trait;
use authcache_core::{AuthError, SessionStatus, STATUS_FIELD};

/// Connection and expiry settings.
pub mod config;
pub use config::CacheConfig;

mod memory;
pub use memory::MemoryStatusCache;

#[cfg(feature = "store-redis")]
mod redis_store;
#[cfg(feature = "store-redis")]
pub use redis_store::RedisStatusCache;

/// Outcome of [`StatusCache::compare_and_set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// The field held the expected (or target) value and now holds the target value.
    Written,
    /// The record or the field does not exist.
    Missing,
    /// The field holds a different value, returned unchanged.
    Conflict(String),
}

/// Key-value operations the session lifecycle needs from a remote store.
///
/// Implementations must be safe for concurrent use: one handle is shared by every
/// in-flight request. Every method is a single round-trip; no client-side caching is
/// layered on top, so a read always observes the latest write on the same store.
#[async_trait]
pub trait StatusCache: Send + Sync + 'static {
    /// Upsert `field` on the record addressed by `key`, leaving other fields untouched.
    async fn set(&self, key: &str, field: &str, value: &str) -> Result<(), AuthError>;

    /// Upsert `field` and (re)arm the record's expiry in one atomic step.
    async fn set_with_expiry(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: chrono::Duration,
    ) -> Result<(), AuthError>;

    /// Atomically replace `field` with `value` when it currently holds `expected`
    /// (or already holds `value`).
    ///
    /// Nothing is written when the record or field is absent, or when the field holds
    /// anything else.
    async fn compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        value: &str,
    ) -> Result<FieldUpdate, AuthError>;

    /// Read `field` from the record. `Ok(None)` when the key or the field is absent.
    async fn get(&self, key: &str, field: &str) -> Result<Option<String>, AuthError>;

    /// Remove the whole record. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), AuthError>;

    /// Read and validate the status field of a session.
    async fn get_status(&self, key: &str) -> Result<Option<SessionStatus>, AuthError> {
        match self.get(key, STATUS_FIELD).await? {
            Some(raw) => raw.parse().map(Some),
            None => Ok(None),
        }
    }

    /// Write the status field of a session.
    async fn set_status(&self, key: &str, status: SessionStatus) -> Result<(), AuthError> {
        self.set(key, STATUS_FIELD, status.as_str()).await
    }
}

/// Whole seconds for a store-side expiry, never less than one.
pub(crate) fn ttl_seconds(ttl: chrono::Duration) -> i64 {
    ttl.num_seconds().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_floor() {
        assert_eq!(ttl_seconds(chrono::Duration::minutes(15)), 900);
        assert_eq!(ttl_seconds(chrono::Duration::milliseconds(10)), 1);
        assert_eq!(ttl_seconds(chrono::Duration::seconds(-5)), 1);
    }
}
