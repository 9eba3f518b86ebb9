use crate::{ttl_seconds, CacheConfig, FieldUpdate, StatusCache};
use async_trait::async_trait;
use authcache_core::AuthError;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// Replies {0, ''} when the field is absent, {1, old} after writing, {2, current} on conflict.
const COMPARE_AND_SET: &str = r#"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then
    return {0, ''}
end
if current == ARGV[2] or current == ARGV[3] then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
    return {1, current}
end
return {2, current}
"#;

/// A status cache backed by Redis hashes.
///
/// One multiplexed connection is opened at startup and shared by every caller;
/// clones of this handle reuse it. A handle whose startup health check failed stays
/// uninitialized and rejects every call with [`AuthError::CacheUnavailable`]
/// instead of reconnecting inline.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn: Option<MultiplexedConnection>,
    operation_timeout: Duration,
    compare_and_set: Arc<redis::Script>,
}

impl std::fmt::Debug for RedisStatusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStatusCache")
            .field("initialized", &self.conn.is_some())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl RedisStatusCache {
    /// Connect to the configured store and verify it answers `PING`.
    pub async fn connect(config: &CacheConfig) -> Result<Self, AuthError> {
        let client = redis::Client::open(config.redis_url())
            .map_err(|e| AuthError::Connection(e.to_string()))?;

        let mut conn = tokio::time::timeout(
            config.operation_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            AuthError::Connection(format!("timed out connecting to {}", config.address))
        })?
        .map_err(|e| AuthError::Connection(e.to_string()))?;

        tokio::time::timeout(
            config.operation_timeout,
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| {
            AuthError::Connection(format!("health check to {} timed out", config.address))
        })?
        .map_err(|e| AuthError::Connection(e.to_string()))?;

        tracing::debug!(address = %config.address, "Connected to status cache");

        Ok(Self {
            conn: Some(conn),
            operation_timeout: config.operation_timeout,
            compare_and_set: Arc::new(redis::Script::new(COMPARE_AND_SET)),
        })
    }

    /// Connect, or fall back to an uninitialized handle if the store is unreachable.
    ///
    /// The process keeps serving; login flows fail with `CacheUnavailable` until it is
    /// restarted against a reachable store.
    pub async fn connect_or_unavailable(config: &CacheConfig) -> Self {
        match Self::connect(config).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(
                    address = %config.address,
                    error = %e,
                    "Status cache unreachable, continuing without it"
                );
                Self::unavailable(config)
            }
        }
    }

    /// A handle that was never connected.
    pub fn unavailable(config: &CacheConfig) -> Self {
        Self {
            conn: None,
            operation_timeout: config.operation_timeout,
            compare_and_set: Arc::new(redis::Script::new(COMPARE_AND_SET)),
        }
    }

    /// Whether the startup health check succeeded.
    pub fn is_initialized(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&self) -> Result<MultiplexedConnection, AuthError> {
        self.conn.clone().ok_or(AuthError::CacheUnavailable)
    }

    async fn bounded<T, F>(
        &self,
        fut: F,
        to_error: fn(String) -> AuthError,
    ) -> Result<T, AuthError>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(|e| to_error(e.to_string())),
            Err(_) => Err(to_error(format!(
                "timed out after {}ms",
                self.operation_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl StatusCache for RedisStatusCache {
    async fn set(&self, key: &str, field: &str, value: &str) -> Result<(), AuthError> {
        let mut conn = self.connection()?;
        self.bounded(conn.hset::<_, _, _, ()>(key, field, value), AuthError::Write)
            .await
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: chrono::Duration,
    ) -> Result<(), AuthError> {
        let mut conn = self.connection()?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset(key, field, value)
            .ignore()
            .expire(key, ttl_seconds(ttl))
            .ignore();
        self.bounded(pipe.query_async::<()>(&mut conn), AuthError::Write)
            .await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        value: &str,
    ) -> Result<FieldUpdate, AuthError> {
        let mut conn = self.connection()?;
        let mut invocation = self.compare_and_set.key(key);
        invocation.arg(field).arg(expected).arg(value);
        let (code, current): (i64, String) = self
            .bounded(invocation.invoke_async(&mut conn), AuthError::Write)
            .await?;
        match code {
            0 => Ok(FieldUpdate::Missing),
            1 => Ok(FieldUpdate::Written),
            2 => Ok(FieldUpdate::Conflict(current)),
            other => Err(AuthError::Write(format!(
                "unexpected compare-and-set reply {other}"
            ))),
        }
    }

    async fn get(&self, key: &str, field: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.connection()?;
        self.bounded(conn.hget::<_, _, Option<String>>(key, field), AuthError::Read)
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut conn = self.connection()?;
        self.bounded(conn.del::<_, ()>(key), AuthError::Write).await
    }

    async fn ping(&self) -> Result<(), AuthError> {
        let mut conn = self.connection()?;
        self.bounded(
            redis::cmd("PING").query_async::<String>(&mut conn),
            AuthError::Read,
        )
        .await
        .map(|_| ())
    }
}
