use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use super::{new_session, SessionDataStorage, SweepCounter};
use crate::data::DEFAULT_MAX_INACTIVE_INTERVAL;
use crate::error::StorageError;
use crate::logging::{fingerprint, SessionLog};
use crate::transcoder::{JsonSessionDataTranscoder, SessionDataTranscoder};
use crate::web::{SessionRequest, SessionResponse};
use crate::SessionData;

/// Minimal string key/value store with per-entry time-to-live.
///
/// This is the surface a Redis, Memcached or similar client needs to offer
/// to back [`KeyValueSessionDataStorage`]. Expiry is the store's job.
pub trait KeyValueStore: Send + Sync {
    /// Returns the live value under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`. `None` means no expiry.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Drops expired entries the store still holds and returns how many.
    ///
    /// Stores that expire keys themselves keep the default no-op.
    fn purge_expired(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process [`KeyValueStore`].
///
/// Expired entries are dropped by the `get` that finds them, by a sweep
/// every few hundred writes, or by [`KeyValueStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<String, Entry>,
    writes: SweepCounter,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let now = Utc::now();
        if self.entries.remove_if(key, |_, e| !e.is_live(now)).is_some() {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StorageError> {
        let expires_at = match ttl {
            None => None,
            Some(ttl) => {
                let delta = TimeDelta::from_std(ttl)
                    .map_err(|e| StorageError::Backend(format!("ttl out of range: {e}")))?;
                Some(Utc::now().checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC))
            }
        };
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        if self.writes.record_write() {
            self.purge_expired()?;
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

/// Server-side storage over any [`KeyValueStore`].
///
/// Sessions are transcoded (JSON by default) and stored under
/// `prefix + id` with a time-to-live equal to the session's idle interval.
/// Every save at commit pushes the expiry forward, so a session stays alive
/// for as long as it keeps being used.
///
/// # Examples
///
/// ```
/// use session_core::web::{SessionRequest, SessionResponse};
/// use session_core::{KeyValueSessionDataStorage, MemoryKeyValueStore, SessionDataStorage};
///
/// let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new());
/// let request = SessionRequest::new("req-1");
///
/// let mut data = storage.create();
/// data.put("user", "alice");
/// storage.save(&request, &mut SessionResponse::new(), &data).unwrap();
///
/// let loaded = storage.get(&request, data.id()).unwrap().unwrap();
/// assert_eq!(loaded.get("user"), Some("alice"));
/// ```
pub struct KeyValueSessionDataStorage<S> {
    store: S,
    transcoder: Box<dyn SessionDataTranscoder>,
    prefix: String,
    idle_timeout: Option<Duration>,
}

impl<S: KeyValueStore> KeyValueSessionDataStorage<S> {
    /// Default key prefix.
    pub const DEFAULT_PREFIX: &'static str = "session:";

    /// Creates a storage over `store` using the JSON transcoder.
    pub fn new(store: S) -> Self {
        Self {
            store,
            transcoder: Box::new(JsonSessionDataTranscoder),
            prefix: Self::DEFAULT_PREFIX.to_string(),
            idle_timeout: Some(DEFAULT_MAX_INACTIVE_INTERVAL),
        }
    }

    /// Replaces the transcoder.
    pub fn with_transcoder(mut self, transcoder: Box<dyn SessionDataTranscoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Sets the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the idle interval stamped on new sessions.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }
}

impl<S: KeyValueStore> SessionDataStorage for KeyValueSessionDataStorage<S> {
    fn create(&self) -> SessionData {
        new_session(self.idle_timeout)
    }

    fn save(
        &self,
        _request: &SessionRequest,
        _response: &mut SessionResponse,
        data: &SessionData,
    ) -> Result<(), StorageError> {
        let payload = self.transcoder.encode(data)?;
        self.store
            .set(&self.key(data.id()), payload, data.max_inactive_interval())
    }

    fn get(&self, request: &SessionRequest, id: &str) -> Result<Option<SessionData>, StorageError> {
        let key = self.key(id);
        let Some(payload) = self.store.get(&key)? else {
            return Ok(None);
        };

        match self.transcoder.decode(&payload) {
            Ok(data) if data.id() == id => Ok(Some(data)),
            Ok(_) | Err(_) => {
                SessionLog::new(request.request_id()).warn(format_args!(
                    "dropping unreadable stored session {}",
                    fingerprint(id)
                ));
                self.store.delete(&key)?;
                Ok(None)
            }
        }
    }

    fn delete(
        &self,
        _request: &SessionRequest,
        _response: &mut SessionResponse,
        id: &str,
    ) -> Result<(), StorageError> {
        self.store.delete(&self.key(id))
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        self.store.purge_expired()
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for KeyValueSessionDataStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueSessionDataStorage")
            .field("store", &self.store)
            .field("prefix", &self.prefix)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapSessionDataTranscoder;

    fn request() -> SessionRequest {
        SessionRequest::new("req-kv")
    }

    #[test]
    fn store_honours_ttl() {
        let store = MemoryKeyValueStore::new();
        store.set("live", "1".to_string(), Some(Duration::from_secs(60))).expect("sets");
        store.set("forever", "2".to_string(), None).expect("sets");
        store.set("dead", "3".to_string(), Some(Duration::ZERO)).expect("sets");

        assert_eq!(store.get("live").expect("gets"), Some("1".to_string()));
        assert_eq!(store.get("forever").expect("gets"), Some("2".to_string()));
        assert_eq!(store.get("dead").expect("gets"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unread_expired_entries_are_reclaimed() {
        let store = MemoryKeyValueStore::new();
        for i in 0..1000 {
            store.set(&format!("k{i}"), "v".to_string(), Some(Duration::ZERO)).expect("sets");
        }
        assert!(store.len() < 128, "still holding {}", store.len());

        store.set("keep", "v".to_string(), None).expect("sets");
        std::thread::sleep(Duration::from_millis(5));
        store.purge_expired().expect("purges");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("keep").expect("gets"), Some("v".to_string()));
    }

    #[test]
    fn storage_purge_reaches_store() {
        let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())
            .with_idle_timeout(Some(Duration::ZERO));
        let mut response = SessionResponse::new();
        for _ in 0..3 {
            storage.save(&request(), &mut response, &storage.create()).expect("saves");
        }
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(storage.purge_expired().expect("purges"), 3);
        assert!(storage.store().is_empty());
    }

    #[test]
    fn store_delete_is_idempotent() {
        let store = MemoryKeyValueStore::new();
        store.set("k", "v".to_string(), None).expect("sets");
        store.delete("k").expect("deletes");
        store.delete("k").expect("deletes again");
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_prefixed() {
        let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new()).with_prefix("app:");
        let data = storage.create();
        storage.save(&request(), &mut SessionResponse::new(), &data).expect("saves");

        let raw = storage.store().get(&format!("app:{}", data.id())).expect("gets");
        assert!(raw.is_some());
    }

    #[test]
    fn idle_session_expires_without_delete() {
        let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())
            .with_idle_timeout(Some(Duration::ZERO));
        let data = storage.create();
        storage.save(&request(), &mut SessionResponse::new(), &data).expect("saves");

        assert!(storage.get(&request(), data.id()).expect("gets").is_none());
    }

    #[test]
    fn garbage_is_dropped() {
        let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new());
        storage.store().set("session:abc", "garbage".to_string(), None).expect("sets");

        assert!(storage.get(&request(), "abc").expect("gets").is_none());
        assert!(storage.store().is_empty());
    }

    #[test]
    fn custom_transcoder_round_trips() {
        let storage = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())
            .with_transcoder(Box::new(MapSessionDataTranscoder));
        let mut data = storage.create();
        data.put("lang", "ro");
        let mut response = SessionResponse::new();
        storage.save(&request(), &mut response, &data).expect("saves");

        let loaded = storage.get(&request(), data.id()).expect("gets").expect("found");
        assert_eq!(loaded.get("lang"), Some("ro"));

        storage.delete(&request(), &mut response, data.id()).expect("deletes");
        assert!(storage.get(&request(), data.id()).expect("gets").is_none());
        assert!(response.is_empty());
    }
}
