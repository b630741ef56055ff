use std::time::Duration;

use dashmap::DashMap;

use super::{new_session, SessionDataStorage, SweepCounter};
use crate::data::{now_millis, DEFAULT_MAX_INACTIVE_INTERVAL};
use crate::error::StorageError;
use crate::web::{SessionRequest, SessionResponse};
use crate::SessionData;

/// In-process session store.
///
/// Sessions are cloned in and out of a concurrent map. An idle session is
/// removed by the `get` that finds it expired, by a sweep that runs every
/// few hundred saves, or on demand through
/// [`SessionDataStorage::purge_expired`].
#[derive(Debug)]
pub struct MemorySessionDataStorage {
    sessions: DashMap<String, SessionData>,
    idle_timeout: Option<Duration>,
    writes: SweepCounter,
}

impl MemorySessionDataStorage {
    /// Creates an empty store whose sessions idle out after 30 minutes.
    pub fn new() -> Self {
        Self::with_idle_timeout(Some(DEFAULT_MAX_INACTIVE_INTERVAL))
    }

    /// Creates an empty store with the given idle interval for new sessions.
    pub fn with_idle_timeout(idle_timeout: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            writes: SweepCounter::default(),
        }
    }

    fn sweep(&self) -> usize {
        let now = now_millis();
        let before = self.sessions.len();
        self.sessions.retain(|_, data| !data.is_expired_at(now));
        before.saturating_sub(self.sessions.len())
    }

    /// Returns the number of stored sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session is stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionDataStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDataStorage for MemorySessionDataStorage {
    fn create(&self) -> SessionData {
        new_session(self.idle_timeout)
    }

    fn save(
        &self,
        _request: &SessionRequest,
        _response: &mut SessionResponse,
        data: &SessionData,
    ) -> Result<(), StorageError> {
        self.sessions.insert(data.id().to_string(), data.clone());
        if self.writes.record_write() {
            self.sweep();
        }
        Ok(())
    }

    fn get(&self, _request: &SessionRequest, id: &str) -> Result<Option<SessionData>, StorageError> {
        let now = now_millis();

        if self
            .sessions
            .remove_if(id, |_, data| data.is_expired_at(now))
            .is_some()
        {
            return Ok(None);
        }

        Ok(self.sessions.get_mut(id).map(|mut entry| {
            entry.value_mut().set_last_accessed_time(now);
            entry.value().clone()
        }))
    }

    fn delete(
        &self,
        _request: &SessionRequest,
        _response: &mut SessionResponse,
        id: &str,
    ) -> Result<(), StorageError> {
        self.sessions.remove(id);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        Ok(self.sweep())
    }
}
