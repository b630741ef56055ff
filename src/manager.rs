//! Per-request session resolution and end-of-request commit.
//!
//! [`SessionManager`] is built once at startup and shared across request
//! threads. For each request it hands out a [`SessionScope`], the
//! session-aware view of that request: it resolves the session lazily on
//! first access, creates one on demand, and at the end of the request
//! writes the session back through the storage and strategy.
//!
//! # State machine
//!
//! ```text
//! NotAccessed ──get──▶ ExistingValid | ExistingInvalid | New ──commit──▶ (consumed)
//! ```
//!
//! Resolution happens at most once per request. Commit consumes the scope,
//! so it runs exactly once.

use std::fmt;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::{ConfigError, Error, StorageError};
use crate::logging::{fingerprint, SessionLog};
use crate::web::{SessionRequest, SessionResponse};
use crate::{
    Sanitizer, Session, SessionDataStorage, SessionIdSanitizer, SessionStrategy, SessionData,
};

/// How the session of a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No session has been asked for yet, or none was requested and none created.
    NotAccessed,
    /// The client presented an id that refers to a live session.
    ExistingValid,
    /// The client presented an id that does not refer to a live session.
    ExistingInvalid,
    /// A session was created during this request.
    New,
}

/// What [`SessionScope::commit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to persist and nothing to tell the client.
    Untouched,
    /// The session was saved.
    Saved {
        /// Whether the session id was (re)sent to the client.
        cookie_written: bool,
    },
    /// The session was invalidated; storage was cleared and the client told to forget it.
    Invalidated,
    /// The client presented a dead session id and was told to forget it.
    StaleCookieCleared,
}

/// Orchestrates session resolution and commit for every request.
///
/// # Examples
///
/// ```
/// use session_core::web::{SessionRequest, SessionResponse};
/// use session_core::{CookieSessionStrategy, MemorySessionDataStorage, SessionManager};
///
/// let manager = SessionManager::new(MemorySessionDataStorage::new(), CookieSessionStrategy::default());
///
/// let request = SessionRequest::new("req-1");
/// let mut response = SessionResponse::new();
///
/// let id = manager
///     .handle(&request, &mut response, |scope| {
///         let session = scope.session();
///         session.put("user", "alice");
///         Ok(session.id().to_string())
///     })
///     .unwrap();
///
/// assert_eq!(response.cookie("SESSIONID").map(|c| c.value()), Some(id.as_str()));
/// ```
#[derive(Clone)]
pub struct SessionManager {
    storage: Arc<dyn SessionDataStorage>,
    strategy: Arc<dyn SessionStrategy>,
    sanitizer: SessionIdSanitizer,
}

impl SessionManager {
    /// Creates a manager from a storage backend and an id transport.
    pub fn new(
        storage: impl SessionDataStorage + 'static,
        strategy: impl SessionStrategy + 'static,
    ) -> Self {
        Self::from_parts(Arc::new(storage), Arc::new(strategy))
    }

    /// Creates a manager from shared components.
    pub fn from_parts(
        storage: Arc<dyn SessionDataStorage>,
        strategy: Arc<dyn SessionStrategy>,
    ) -> Self {
        Self {
            storage,
            strategy,
            sanitizer: SessionIdSanitizer::default(),
        }
    }

    /// Builds the storage and strategy named by `config`.
    ///
    /// # Errors
    ///
    /// Fails on missing secrets or unusable settings, so that
    /// misconfiguration surfaces at startup rather than per request.
    pub fn from_config(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = config.build_strategy();
        let storage = config.build_storage()?;
        Ok(Self::from_parts(storage, Arc::new(strategy)))
    }

    /// Replaces the sanitizer applied to requested session ids.
    pub fn with_sanitizer(mut self, sanitizer: SessionIdSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &dyn SessionDataStorage {
        self.storage.as_ref()
    }

    /// Returns the id transport.
    pub fn strategy(&self) -> &dyn SessionStrategy {
        self.strategy.as_ref()
    }

    /// Drops expired sessions the storage still holds.
    ///
    /// In-process backends also sweep on their own as they are written to;
    /// call this from a timer to bound memory between bursts of traffic.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        let purged = self.storage.purge_expired()?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired sessions");
        }
        Ok(purged)
    }

    /// Opens the session view of `request`.
    ///
    /// The requested id is read and sanitized here; storage is not touched
    /// until the session is first asked for.
    pub fn scope<'a>(&'a self, request: &'a SessionRequest) -> SessionScope<'a> {
        let log = SessionLog::new(request.request_id());

        let requested = match self.strategy.requested_session_id(request) {
            None => RequestedId::Absent,
            Some(tainted) => match self.sanitizer.sanitize(tainted) {
                Ok(id) => RequestedId::Present(id.into_inner()),
                Err(e) => {
                    log.warn(format_args!("ignoring requested session id: {e}"));
                    RequestedId::Rejected
                }
            },
        };

        SessionScope {
            manager: self,
            request,
            log,
            requested,
            lookup: Lookup::NotDone,
            found: None,
            session: None,
            resolution: Resolution::NotAccessed,
            invalidated: Vec::new(),
        }
    }

    /// Runs `handler` inside a session scope and commits afterwards.
    ///
    /// The commit runs whether or not the handler succeeds. A handler
    /// error is returned in preference to a commit error; in that case the
    /// commit error is only logged.
    pub fn handle<T, F>(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        handler: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(&mut SessionScope<'_>) -> Result<T, Error>,
    {
        let mut scope = self.scope(request);
        let outcome = handler(&mut scope);
        let committed = scope.commit(response);

        match (outcome, committed) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(Error::Storage(e)),
            (Err(e), _) => Err(e),
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("sanitizer", &self.sanitizer)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestedId {
    Absent,
    Rejected,
    Present(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    NotDone,
    Valid,
    Invalid,
    Failed,
}

/// The session-aware view of one request.
///
/// Obtained from [`SessionManager::scope`] or inside
/// [`SessionManager::handle`]. Not shared across requests.
pub struct SessionScope<'a> {
    manager: &'a SessionManager,
    request: &'a SessionRequest,
    log: SessionLog<'a>,
    requested: RequestedId,
    lookup: Lookup,
    found: Option<SessionData>,
    session: Option<Session>,
    resolution: Resolution,
    invalidated: Vec<String>,
}

impl<'a> SessionScope<'a> {
    /// Returns the session, creating one if none exists.
    pub fn session(&mut self) -> &mut Session {
        self.resolve(true);
        let manager = self.manager;
        let storage = manager.storage.as_ref();
        self.session
            .get_or_insert_with(|| Session::created(storage.create()))
    }

    /// Returns the session only if one already exists.
    pub fn existing_session(&mut self) -> Option<&mut Session> {
        self.get_session(false)
    }

    /// Returns the session, creating one when `create` is true.
    ///
    /// Repeated calls return the same session.
    pub fn get_session(&mut self, create: bool) -> Option<&mut Session> {
        self.resolve(create);
        self.session.as_mut()
    }

    /// Returns the session id the client presented, if it was well-formed.
    pub fn requested_session_id(&self) -> Option<&str> {
        match &self.requested {
            RequestedId::Present(id) => Some(id),
            RequestedId::Absent | RequestedId::Rejected => None,
        }
    }

    /// Returns true if the presented session id refers to a live session.
    ///
    /// Looks the id up on first call; the result is cached for the request.
    pub fn is_requested_session_id_valid(&mut self) -> bool {
        self.lookup();
        self.lookup == Lookup::Valid
    }

    /// Invalidates the current session.
    ///
    /// The session is detached immediately. Its stored data is deleted and
    /// the client told to forget the id when the scope commits. Returns
    /// false if there was no session to invalidate.
    pub fn invalidate(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                self.log
                    .info(format_args!("invalidating session {}", fingerprint(session.id())));
                self.invalidated.push(session.id().to_string());
                true
            }
            None => false,
        }
    }

    /// Returns how the session was resolved so far.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the request this scope belongs to.
    pub fn request(&self) -> &SessionRequest {
        self.request
    }

    /// Writes the session back and tells the client about id changes.
    ///
    /// - Invalidated sessions are deleted from storage.
    /// - A live session is saved; its id is sent to the client if it is new
    ///   or differs from the one presented.
    /// - With no session, an invalidation clears the client's id, and so
    ///   does a presented id that turned out not to exist.
    ///
    /// # Errors
    ///
    /// Storage failures are returned; the client is then not told about a
    /// new session id.
    pub fn commit(mut self, response: &mut SessionResponse) -> Result<CommitOutcome, StorageError> {
        let result = self.commit_inner(response);
        match &result {
            Ok(outcome) => self.log.debug(format_args!("session commit: {outcome:?}")),
            Err(e) => self.log.error(format_args!("session commit failed: {e}")),
        }
        result
    }

    fn commit_inner(&mut self, response: &mut SessionResponse) -> Result<CommitOutcome, StorageError> {
        let manager = self.manager;
        let storage = manager.storage.as_ref();
        let strategy = manager.strategy.as_ref();

        for id in &self.invalidated {
            storage.delete(self.request, response, id)?;
        }

        if let Some(session) = self.session.take() {
            storage.save(self.request, response, session.data())?;

            let write_id = self.lookup != Lookup::Valid
                || self.requested_session_id() != Some(session.id());
            if write_id {
                strategy.on_new_session(self.request, response, session.data());
            }
            return Ok(CommitOutcome::Saved {
                cookie_written: write_id,
            });
        }

        if !self.invalidated.is_empty() {
            strategy.on_invalidated_session(self.request, response);
            return Ok(CommitOutcome::Invalidated);
        }

        if self.requested == RequestedId::Absent {
            return Ok(CommitOutcome::Untouched);
        }

        self.lookup();
        if self.lookup == Lookup::Invalid {
            // Lets cookie storage drop a payload cookie that failed to decode.
            if let RequestedId::Present(id) = &self.requested {
                storage.delete(self.request, response, id)?;
            }
            strategy.on_invalidated_session(self.request, response);
            return Ok(CommitOutcome::StaleCookieCleared);
        }

        Ok(CommitOutcome::Untouched)
    }

    fn resolve(&mut self, create: bool) {
        if self.session.is_some() {
            return;
        }

        self.lookup();
        if let Some(mut data) = self.found.take() {
            data.touch();
            self.log
                .debug(format_args!("resumed session {}", fingerprint(data.id())));
            self.session = Some(Session::existing(data));
            self.resolution = Resolution::ExistingValid;
            return;
        }

        if self.resolution == Resolution::NotAccessed && self.requested != RequestedId::Absent {
            self.resolution = Resolution::ExistingInvalid;
        }

        if create {
            let data = self.manager.storage.create();
            self.log
                .debug(format_args!("created session {}", fingerprint(data.id())));
            self.session = Some(Session::created(data));
            self.resolution = Resolution::New;
        }
    }

    fn lookup(&mut self) {
        if self.lookup != Lookup::NotDone {
            return;
        }

        let id = match &self.requested {
            RequestedId::Present(id) => id,
            RequestedId::Absent | RequestedId::Rejected => {
                self.lookup = Lookup::Invalid;
                return;
            }
        };

        self.lookup = match self.manager.storage.get(self.request, id) {
            Ok(Some(data)) if data.id() == id => {
                self.found = Some(data);
                Lookup::Valid
            }
            Ok(_) => {
                self.log
                    .debug(format_args!("requested session {} not found", fingerprint(id)));
                Lookup::Invalid
            }
            Err(e) => {
                self.log.warn(format_args!(
                    "lookup of session {} failed, treating as absent: {e}",
                    fingerprint(id)
                ));
                Lookup::Failed
            }
        };
    }
}

impl fmt::Debug for SessionScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionScope")
            .field("request_id", &self.request.request_id())
            .field("resolution", &self.resolution)
            .field("invalidated", &self.invalidated.len())
            .finish_non_exhaustive()
    }
}
