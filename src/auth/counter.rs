use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;

/// Volatile keyed counters with expiry (a cache, not a database).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, 0 when absent or expired.
    async fn get(&self, key: &str) -> Result<i64, AppError>;

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Increment and return the new value. The expiry is fixed when the entry
    /// is created and left alone by later increments.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, AppError>;
}

struct CounterEntry {
    value: i64,
    expires_at: DateTime<Utc>,
}

impl CounterEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        info!("Initializing in-memory counter store");
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CounterEntry>> {
        // Entries are plain integers; a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            info!("Purged {} expired counters", removed);
        }
        removed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<i64, AppError> {
        let now = Utc::now();
        let entries = self.lock();
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
            .unwrap_or(0))
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), AppError> {
        debug!("Setting counter {} = {}", key, value);
        self.lock().insert(
            key.to_string(),
            CounterEntry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        debug!("Deleting counter {}", key);
        self.lock().remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, AppError> {
        let now = Utc::now();
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert(CounterEntry {
            value: 0,
            expires_at: now + ttl,
        });
        if !entry.is_live(now) {
            entry.value = 0;
            entry.expires_at = now + ttl;
        }
        entry.value += 1;
        debug!("Counter {} incremented to {}", key, entry.value);
        Ok(entry.value)
    }
}
