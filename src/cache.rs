//! Expiring, time-stamped values on top of a [`KeyValueStore`].
//!
//! Values are stored as `{"value": ..., "timestamp": <unix millis>}`. A value
//! older than the expiry window is deleted on read and the cache falls back to
//! its initial value. Storage failures never reach the caller: they are logged
//! and the in-memory value stays authoritative for the session.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::kv::KeyValueStore;

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Serialize, Deserialize)]
struct Stored<T> {
    value: T,
    timestamp: i64,
}

#[derive(Deserialize)]
struct Stamp {
    timestamp: i64,
}

pub struct ExpiringCache<'a, T> {
    storage: Option<&'a dyn KeyValueStore>,
    clock: &'a dyn Clock,
    key: String,
    initial: T,
    value: T,
    expiry_ms: i64,
    expired: bool,
}

impl<'a, T> ExpiringCache<'a, T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the cache and load whatever is stored under `key`.
    ///
    /// `storage` is `None` when no persistent storage exists; the cache then
    /// behaves as a plain in-memory cell.
    pub fn new(
        storage: Option<&'a dyn KeyValueStore>,
        clock: &'a dyn Clock,
        key: impl Into<String>,
        initial: T,
        expiry_hours: i64,
    ) -> Self {
        let mut cache = Self {
            storage,
            clock,
            key: key.into(),
            value: initial.clone(),
            initial,
            expiry_ms: expiry_hours.saturating_mul(MILLIS_PER_HOUR),
            expired: false,
        };
        cache.value = cache.read();
        cache
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Re-read the stored value, discarding it when stale.
    pub fn get(&mut self) -> T {
        let value = self.read();
        self.value = value.clone();
        value
    }

    /// The in-memory value as of the last read or write.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.expired = false;
        self.write();
    }

    /// Functional form of [`set`](Self::set): the closure receives the current value.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.value);
        self.set(next);
    }

    pub fn remove(&mut self) {
        self.value = self.initial.clone();
        if let Some(storage) = self.storage {
            if let Err(e) = storage.remove_item(&self.key) {
                tracing::warn!(key = %self.key, error = %e, "failed to remove cached value");
            }
        }
    }

    /// True when a stored value exists and is past the expiry window. Reads
    /// only; never deletes.
    pub fn check_expiry(&self) -> bool {
        let Some(storage) = self.storage else {
            return false;
        };
        match storage.get_item(&self.key) {
            Ok(Some(raw)) => serde_json::from_str::<Stamp>(&raw)
                .map(|stamp| self.is_stale(stamp.timestamp))
                .unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to probe cached value");
                false
            }
        }
    }

    /// A timestamp too far from now to subtract counts as stale.
    fn is_stale(&self, timestamp: i64) -> bool {
        match self.clock.now().timestamp_millis().checked_sub(timestamp) {
            Some(age) => age > self.expiry_ms,
            None => true,
        }
    }

    fn read(&mut self) -> T {
        let Some(storage) = self.storage else {
            return self.initial.clone();
        };
        let raw = match storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.initial.clone(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read cached value");
                return self.initial.clone();
            }
        };
        let stored: Stored<T> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "ignoring malformed cached value");
                return self.initial.clone();
            }
        };
        if self.is_stale(stored.timestamp) {
            tracing::debug!(key = %self.key, "cached value expired");
            if let Err(e) = storage.remove_item(&self.key) {
                tracing::warn!(key = %self.key, error = %e, "failed to remove expired value");
            }
            self.expired = true;
            return self.initial.clone();
        }
        stored.value
    }

    fn write(&self) {
        let Some(storage) = self.storage else {
            return;
        };
        let stored = Stored {
            value: &self.value,
            timestamp: self.clock.now().timestamp_millis(),
        };
        let result = serde_json::to_string(&stored)
            .map_err(crate::error::FactdeskError::from)
            .and_then(|json| storage.set_item(&self.key, &json));
        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "failed to persist cached value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{FactdeskError, Result};
    use crate::kv::MemoryKv;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    struct BrokenKv;

    impl KeyValueStore for BrokenKv {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(FactdeskError::Storage("disabled".into()))
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(FactdeskError::Storage("quota exceeded".into()))
        }
        fn remove_item(&self, _key: &str) -> Result<()> {
            Err(FactdeskError::Storage("disabled".into()))
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_roundtrip_within_window() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", Vec::<String>::new(), 24);
        cache.set(vec!["a".into(), "b".into()]);

        clock.advance(Duration::hours(1));
        let mut reopened = ExpiringCache::new(Some(&kv), &clock, "k", Vec::<String>::new(), 24);
        assert_eq!(reopened.get(), vec!["a".to_string(), "b".to_string()]);
        assert!(!reopened.is_expired());
    }

    #[test]
    fn test_expiry_boundary() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, 24);
        cache.set(7);

        clock.set(t0() + Duration::hours(24) - Duration::milliseconds(1));
        assert_eq!(cache.get(), 7);
        assert!(!cache.check_expiry());

        clock.set(t0() + Duration::hours(24) + Duration::milliseconds(1));
        assert!(cache.check_expiry());
        assert_eq!(cache.get(), 0);
        assert!(cache.is_expired());
        assert_eq!(kv.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_check_expiry_does_not_delete() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, 1);
        cache.set(1);
        clock.advance(Duration::hours(2));
        assert!(cache.check_expiry());
        assert!(kv.get_item("k").unwrap().is_some());
    }

    #[test]
    fn test_set_clears_expired_flag_and_restamps() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, 1);
        cache.set(1);
        clock.advance(Duration::hours(3));
        cache.get();
        assert!(cache.is_expired());
        cache.set(2);
        assert!(!cache.is_expired());
        clock.advance(Duration::minutes(30));
        assert_eq!(cache.get(), 2);
    }

    #[test]
    fn test_functional_update_sees_previous_value() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "counter", 0u32, 24);
        cache.update(|n| n + 1);
        cache.update(|n| n + 10);
        assert_eq!(*cache.value(), 11);
        assert_eq!(cache.get(), 11);
    }

    #[test]
    fn test_remove_resets_to_initial() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 5u32, 24);
        cache.set(9);
        cache.remove();
        assert_eq!(*cache.value(), 5);
        assert_eq!(kv.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_malformed_json_is_absent() {
        let kv = MemoryKv::new();
        kv.set_item("k", "{not json").unwrap();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 3u32, 24);
        assert_eq!(cache.get(), 3);
        assert!(!cache.is_expired());
        assert!(!cache.check_expiry());
    }

    #[test]
    fn test_extreme_timestamp_is_treated_as_expired() {
        let kv = MemoryKv::new();
        kv.set_item("k", &format!(r#"{{"value":7,"timestamp":{}}}"#, i64::MIN))
            .unwrap();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, 24);
        assert!(cache.check_expiry());
        assert_eq!(cache.get(), 0);
        assert!(cache.is_expired());
        assert_eq!(kv.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_huge_expiry_window_saturates() {
        let kv = MemoryKv::new();
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, i64::MAX / 1000);
        cache.set(5);
        clock.advance(Duration::days(3650));
        assert_eq!(cache.get(), 5);
        assert!(!cache.check_expiry());
    }

    #[test]
    fn test_without_storage_is_in_memory_only() {
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(None, &clock, "k", 1u32, 24);
        cache.set(4);
        assert_eq!(*cache.value(), 4);
        assert_eq!(cache.get(), 1);
        assert!(!cache.check_expiry());
        cache.remove();
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let kv = BrokenKv;
        let clock = FixedClock::at(t0());
        let mut cache = ExpiringCache::new(Some(&kv), &clock, "k", 0u32, 24);
        cache.set(8);
        assert_eq!(*cache.value(), 8);
        assert!(!cache.check_expiry());
        cache.remove();
        assert_eq!(*cache.value(), 0);
    }
}
