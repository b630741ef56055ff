//! The application-facing session handle.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::SessionData;

/// A session as seen by request-handling code.
///
/// Wraps the [`SessionData`] resolved or created for the current request
/// and whether it was created during this request. Handed out by
/// [`SessionScope`](crate::SessionScope); changes are persisted when the
/// scope commits.
#[derive(Debug, Clone)]
pub struct Session {
    data: SessionData,
    is_new: bool,
}

impl Session {
    pub(crate) fn existing(data: SessionData) -> Self {
        Self { data, is_new: false }
    }

    pub(crate) fn created(data: SessionData) -> Self {
        Self { data, is_new: true }
    }

    /// Returns the session id.
    pub fn id(&self) -> &str {
        self.data.id()
    }

    /// Returns true if the session was created during this request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns the creation instant in epoch milliseconds.
    pub fn creation_time(&self) -> i64 {
        self.data.creation_time()
    }

    /// Returns the last-access instant in epoch milliseconds.
    pub fn last_accessed_time(&self) -> i64 {
        self.data.last_accessed_time()
    }

    /// Returns the idle interval.
    pub fn max_inactive_interval(&self) -> Option<Duration> {
        self.data.max_inactive_interval()
    }

    /// Sets the idle interval.
    pub fn set_max_inactive_interval(&mut self, interval: Option<Duration>) {
        self.data.set_max_inactive_interval(interval);
    }

    /// Returns the attribute `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    /// Sets the attribute `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.put(key, value);
    }

    /// Removes the attribute `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    /// Iterates over attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.names()
    }

    /// Decodes the JSON attribute `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data.get_json(key)
    }

    /// Stores `value` as the JSON attribute `key`.
    pub fn put_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> serde_json::Result<()> {
        self.data.put_json(key, value)
    }

    /// Returns the underlying data.
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Returns the underlying data for modification.
    pub fn data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flag_follows_constructor() {
        assert!(Session::created(SessionData::new()).is_new());
        assert!(!Session::existing(SessionData::new()).is_new());
    }

    #[test]
    fn delegates_to_data() {
        let mut session = Session::created(SessionData::new());
        session.put("user", "alice");
        session.put_json("roles", &vec!["reader", "writer"]).expect("serializes");

        assert_eq!(session.get("user"), Some("alice"));
        assert_eq!(
            session.get_json::<Vec<String>>("roles"),
            Some(vec!["reader".to_string(), "writer".to_string()])
        );
        assert_eq!(session.names().collect::<Vec<_>>(), vec!["roles", "user"]);
        assert_eq!(session.remove("user"), Some("alice".to_string()));
        assert_eq!(session.id(), session.data().id());
    }
}
