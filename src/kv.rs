//! Small key/value store with per-entry time-to-live.
//!
//! Both the published feed cache slot and the contact form's submission log
//! live behind [`KvStore`], so handlers never touch process globals directly
//! and tests can swap in a [`MemoryKv`] driven by a [`MockClock`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored value, or `None` when missing or expired.
    async fn get(&self, key: &str) -> Option<String>;
    /// Stores `value`; with `ttl = None` the entry never expires.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>);
    async fn delete(&self, key: &str);
}

/// Wall clock source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| current.checked_add_signed(delta))
        {
            *current = next;
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Process-local store. Overlapping writers race benignly: last write wins.
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKv {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let now = self.clock.now();
        let expires_at = ttl.and_then(|ttl| {
            TimeDelta::from_std(ttl)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta))
        });
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Entry { value, expires_at });
    }

    async fn delete(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> (MemoryKv, MockClock) {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
        (MemoryKv::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let (kv, clock) = store();
        kv.set("events", "[]".to_string(), Some(Duration::from_secs(60)))
            .await;

        clock.advance(Duration::from_secs(59));
        assert_eq!(kv.get("events").await.as_deref(), Some("[]"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(kv.get("events").await, None);
    }

    #[tokio::test]
    async fn entry_without_ttl_survives() {
        let (kv, clock) = store();
        kv.set("k", "v".to_string(), None).await;
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(kv.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn later_write_replaces_earlier() {
        let (kv, _) = store();
        kv.set("k", "first".to_string(), None).await;
        kv.set("k", "second".to_string(), None).await;
        assert_eq!(kv.get("k").await.as_deref(), Some("second"));

        kv.delete("k").await;
        assert_eq!(kv.get("k").await, None);
    }
}
