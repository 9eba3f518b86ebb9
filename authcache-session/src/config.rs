use std::time::Duration;

/// Environment variable holding the store address (`host:port` or a `redis://` URL).
pub const ADDR_ENV: &str = "REDIS_ADDR";
/// Environment variable holding the per-call deadline in milliseconds.
pub const TIMEOUT_ENV: &str = "AUTHCACHE_OPERATION_TIMEOUT_MS";
/// Environment variable holding the session expiry in seconds.
pub const TTL_ENV: &str = "AUTHCACHE_SESSION_TTL_SECS";

/// Address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:6379";

/// Configuration for the status cache connection.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// The store address, `host:port` or a full `redis://` URL.
    pub address: String,
    /// Deadline applied to every round-trip, including the startup health check.
    pub operation_timeout: Duration,
    /// Expiry armed on new session records. `None` leaves eviction to the store's own policy.
    pub session_ttl: Option<chrono::Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            operation_timeout: Duration::from_secs(2),
            session_ttl: None,
        }
    }
}

impl CacheConfig {
    /// Build a configuration from the process environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup(ADDR_ENV).filter(|a| !a.trim().is_empty()) {
            config.address = addr.trim().to_string();
        }
        if let Some(ms) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.operation_timeout = Duration::from_millis(ms);
        }
        config.session_ttl = lookup(TTL_ENV)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map(chrono::Duration::seconds);

        config
    }

    /// Set the store address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the expiry armed on new session records.
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// The connection URL understood by the Redis client.
    pub fn redis_url(&self) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        }
    }
}
