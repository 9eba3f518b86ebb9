use crate::{ttl_seconds, FieldUpdate, StatusCache};
use async_trait::async_trait;
use authcache_core::AuthError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct Record {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl Record {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-process status cache.
///
/// Records live in a shared map; expiry is checked lazily when a record is touched.
/// Clones share the same records, so one instance can stand in for a remote store
/// across many concurrent callers.
#[derive(Debug, Clone)]
pub struct MemoryStatusCache {
    records: Arc<Mutex<HashMap<String, Record>>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryStatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStatusCache {
    /// Create an empty, available cache.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the cache up or down. While down, every operation fails with
    /// [`AuthError::CacheUnavailable`] and the stored records are left as they are.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let records = self.records.lock().await;
        records.values().filter(|r| !r.is_expired(now)).count()
    }

    /// Whether there are no live records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_available(&self) -> Result<(), AuthError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::CacheUnavailable)
        }
    }

    fn purge_expired(records: &mut HashMap<String, Record>, key: &str) {
        let now = Instant::now();
        if records.get(key).is_some_and(|r| r.is_expired(now)) {
            records.remove(key);
        }
    }
}

#[async_trait]
impl StatusCache for MemoryStatusCache {
    async fn set(&self, key: &str, field: &str, value: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;
        Self::purge_expired(&mut records, key);
        records
            .entry(key.to_string())
            .or_default()
            .fields
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: chrono::Duration,
    ) -> Result<(), AuthError> {
        self.ensure_available()?;
        let ttl = std::time::Duration::from_secs(ttl_seconds(ttl) as u64);
        let mut records = self.records.lock().await;
        Self::purge_expired(&mut records, key);
        let record = records.entry(key.to_string()).or_default();
        record.fields.insert(field.to_string(), value.to_string());
        record.expires_at = Some(Instant::now() + ttl);
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        value: &str,
    ) -> Result<FieldUpdate, AuthError> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;
        Self::purge_expired(&mut records, key);
        let Some(current) = records.get_mut(key).and_then(|r| r.fields.get_mut(field)) else {
            return Ok(FieldUpdate::Missing);
        };
        if current.as_str() != expected && current.as_str() != value {
            return Ok(FieldUpdate::Conflict(current.clone()));
        }
        *current = value.to_string();
        Ok(FieldUpdate::Written)
    }

    async fn get(&self, key: &str, field: &str) -> Result<Option<String>, AuthError> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;
        Self::purge_expired(&mut records, key);
        Ok(records.get(key).and_then(|r| r.fields.get(field).cloned()))
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        self.records.lock().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AuthError> {
        self.ensure_available()
    }
}
