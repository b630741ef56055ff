//! Pluggable persistence for session data.
//!
//! Every backend implements the same four-operation contract. Server-side
//! backends ([`MemorySessionDataStorage`], [`KeyValueSessionDataStorage`])
//! keep data keyed by id and only the id travels to the client;
//! [`CookieSessionDataStorage`] embeds the whole session in a cookie.
//!
//! Calls are blocking and never retried. A backend that talks to a network
//! store owns its own pooling and timeouts.

mod cookie;
mod kv;
mod memory;

pub use self::cookie::{CookieSessionDataStorage, DEFAULT_DATA_COOKIE_NAME, DEFAULT_MAX_COOKIE_BYTES};
pub use kv::{KeyValueSessionDataStorage, KeyValueStore, MemoryKeyValueStore};
pub use memory::MemorySessionDataStorage;

use std::time::Duration;

use crate::error::StorageError;
use crate::web::{SessionRequest, SessionResponse};
use crate::SessionData;

/// Create/save/get/delete contract for session persistence.
///
/// The request and response are passed explicitly so that backends which
/// persist into cookies can reach them. Server-side backends ignore them.
///
/// `get` returns `Ok(None)` for unknown, expired or undecodable sessions;
/// `Err` is reserved for backend failures.
pub trait SessionDataStorage: Send + Sync {
    /// Returns a fresh, empty session with a new id.
    fn create(&self) -> SessionData;

    /// Persists `data`, replacing any earlier version.
    fn save(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        data: &SessionData,
    ) -> Result<(), StorageError>;

    /// Loads the session with `id`.
    fn get(&self, request: &SessionRequest, id: &str) -> Result<Option<SessionData>, StorageError>;

    /// Removes the session with `id`.
    fn delete(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        id: &str,
    ) -> Result<(), StorageError>;

    /// Drops every expired session this backend still holds, returning how
    /// many were removed.
    ///
    /// Backends whose store expires entries on its own keep the default,
    /// which does nothing.
    fn purge_expired(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

/// Number of writes between two opportunistic sweeps of an in-process store.
const SWEEP_EVERY_WRITES: usize = 128;

/// Counts writes and says when a sweep is due.
#[derive(Debug, Default)]
struct SweepCounter(std::sync::atomic::AtomicUsize);

impl SweepCounter {
    fn record_write(&self) -> bool {
        let writes = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        writes % SWEEP_EVERY_WRITES == 0
    }
}

/// Which built-in backend to use, for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// [`MemorySessionDataStorage`]
    #[default]
    Memory,
    /// [`CookieSessionDataStorage`]
    Cookie,
    /// [`KeyValueSessionDataStorage`] over a [`MemoryKeyValueStore`]
    KeyValue,
}

fn new_session(idle_timeout: Option<Duration>) -> SessionData {
    let mut data = SessionData::new();
    data.set_max_inactive_interval(idle_timeout);
    data
}
