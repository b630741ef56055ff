//! The persistable session record.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Default idle interval before a session expires: 30 minutes.
pub const DEFAULT_MAX_INACTIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Persistable data about a session.
///
/// Holds the identity of the session (its id and creation time), idle
/// bookkeeping, and the attribute map the application reads and writes
/// while handling a request. Attribute values are strings; use
/// [`put_json`](Self::put_json) and [`get_json`](Self::get_json) for
/// structured values.
///
/// Two `SessionData` values are equal when their ids are equal.
///
/// # Examples
///
/// ```
/// use session_core::SessionData;
///
/// let mut data = SessionData::new();
/// data.put("user", "alice");
///
/// assert_eq!(data.get("user"), Some("alice"));
/// assert_eq!(data.id().len(), 32);
/// assert_eq!(data.remove("user"), Some("alice".to_string()));
/// assert!(data.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    id: String,
    creation_time: i64,
    last_accessed_time: i64,
    max_inactive_interval: Option<Duration>,
    attributes: BTreeMap<String, String>,
}

impl SessionData {
    /// Creates an empty session with a fresh random id.
    ///
    /// The id is a UUID v4 rendered as 32 lowercase hex characters.
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            creation_time: now,
            last_accessed_time: now,
            max_inactive_interval: Some(DEFAULT_MAX_INACTIVE_INTERVAL),
            attributes: BTreeMap::new(),
        }
    }

    /// Rebuilds a session from transported parts.
    ///
    /// Used by transcoders; the last-access time starts at `creation_time`
    /// and the idle interval at its default.
    pub fn restore(
        id: impl Into<String>,
        creation_time: i64,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            creation_time,
            last_accessed_time: creation_time,
            max_inactive_interval: Some(DEFAULT_MAX_INACTIVE_INTERVAL),
            attributes,
        }
    }

    /// Returns the session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the creation instant in epoch milliseconds.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Returns the last-access instant in epoch milliseconds.
    pub fn last_accessed_time(&self) -> i64 {
        self.last_accessed_time
    }

    /// Sets the last-access instant in epoch milliseconds.
    pub fn set_last_accessed_time(&mut self, millis: i64) {
        self.last_accessed_time = millis;
    }

    /// Marks the session as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed_time = now_millis();
    }

    /// Returns the idle interval, `None` meaning the session never idles out.
    pub fn max_inactive_interval(&self) -> Option<Duration> {
        self.max_inactive_interval
    }

    /// Sets the idle interval.
    pub fn set_max_inactive_interval(&mut self, interval: Option<Duration>) {
        self.max_inactive_interval = interval;
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Iterates over attribute names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Returns the attribute map.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Decodes the JSON value stored under `key`.
    ///
    /// Returns `None` when the key is absent or does not hold a `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Stores `value` under `key` as JSON.
    pub fn put_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> serde_json::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, raw);
        Ok(())
    }

    /// Returns true if the session has been idle longer than its interval.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    /// Same as [`is_expired`](Self::is_expired) for a given instant.
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        match self.max_inactive_interval {
            None => false,
            Some(interval) => {
                let interval = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
                now_millis.saturating_sub(interval) >= self.last_accessed_time
            }
        }
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SessionData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionData {}

impl Hash for SessionData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
