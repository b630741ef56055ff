use std::time::Duration;

use cookie::time::Duration as CookieDuration;
use cookie::Cookie;

use super::{new_session, SessionDataStorage};
use crate::data::{now_millis, DEFAULT_MAX_INACTIVE_INTERVAL};
use crate::error::StorageError;
use crate::logging::{fingerprint, SessionLog};
use crate::transcoder::{MapSessionDataTranscoder, SessionDataTranscoder, SignedSessionDataTranscoder};
use crate::web::{SessionRequest, SessionResponse};
use crate::{Secret, SessionData};

/// Default name of the cookie carrying the session payload.
pub const DEFAULT_DATA_COOKIE_NAME: &str = "SESSION_DATA";

/// Default upper bound on a rendered payload cookie, in bytes.
///
/// Browsers drop cookies above roughly 4 KiB.
pub const DEFAULT_MAX_COOKIE_BYTES: usize = 4096;

/// Self-contained session storage: the whole session lives in a cookie.
///
/// `save` encodes the session with the configured transcoder and sets it as
/// a cookie on the response; `get` decodes the cookie from the request.
/// The transcoder should sign (and preferably encrypt) the payload, since
/// the client holds it.
///
/// The client may ignore `Max-Age`, so `get` enforces expiry itself: a
/// payload whose last access is older than the idle timeout (or the
/// cookie's max age, whichever is shorter) is treated as absent. The
/// payload format must carry the last-access time; both built-in plain
/// transcoders do.
///
/// A payload whose rendered cookie exceeds the size limit is refused at
/// `save` with [`StorageError::PayloadTooLarge`] rather than truncated.
///
/// # Examples
///
/// ```
/// use session_core::web::{SessionRequest, SessionResponse};
/// use session_core::{CookieSessionDataStorage, Secret, SessionDataStorage};
///
/// let storage = CookieSessionDataStorage::signed(Secret::new("hmac-key".to_string()));
///
/// let mut data = storage.create();
/// data.put("user", "alice");
///
/// let mut response = SessionResponse::new();
/// storage.save(&SessionRequest::new("req-1"), &mut response, &data).unwrap();
///
/// // The next request sends the cookie back.
/// let cookie = response.cookie("SESSION_DATA").unwrap();
/// let mut next = SessionRequest::new("req-2");
/// next.add_cookie(cookie.name(), cookie.value());
///
/// let loaded = storage.get(&next, data.id()).unwrap().unwrap();
/// assert_eq!(loaded.get("user"), Some("alice"));
/// ```
pub struct CookieSessionDataStorage {
    transcoder: Box<dyn SessionDataTranscoder>,
    name: String,
    path: String,
    domain: Option<String>,
    max_age: Option<Duration>,
    max_cookie_bytes: usize,
    idle_timeout: Option<Duration>,
}

impl CookieSessionDataStorage {
    /// Creates a storage encoding sessions with `transcoder`.
    pub fn new(transcoder: impl SessionDataTranscoder + 'static) -> Self {
        Self {
            transcoder: Box::new(transcoder),
            name: DEFAULT_DATA_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            domain: None,
            max_age: None,
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
            idle_timeout: Some(DEFAULT_MAX_INACTIVE_INTERVAL),
        }
    }

    /// Creates a storage with flat-map payloads signed by HMAC-SHA256.
    pub fn signed(hmac_key: Secret<String>) -> Self {
        Self::new(SignedSessionDataTranscoder::new(MapSessionDataTranscoder, hmac_key))
    }

    /// Sets the payload cookie name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the payload cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the payload cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets `Max-Age` on the payload cookie. `None` makes it a browser-session cookie.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the largest rendered cookie `save` will emit.
    pub fn with_max_cookie_bytes(mut self, limit: usize) -> Self {
        self.max_cookie_bytes = limit;
        self
    }

    /// Sets the idle interval stamped on new sessions and enforced on read.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns the payload cookie name.
    pub fn cookie_name(&self) -> &str {
        &self.name
    }

    /// Longest a payload may go unaccessed before `get` refuses it.
    fn expiry_bound(&self) -> Option<Duration> {
        match (self.idle_timeout, self.max_age) {
            (Some(idle), Some(max_age)) => Some(idle.min(max_age)),
            (idle, max_age) => idle.or(max_age),
        }
    }

    fn data_cookie(&self, request: &SessionRequest, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(request.is_secure())
            .path(self.path.clone());
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(max_age) = self.max_age {
            let secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(CookieDuration::seconds(secs));
        }
        builder.build()
    }
}

impl SessionDataStorage for CookieSessionDataStorage {
    fn create(&self) -> SessionData {
        new_session(self.idle_timeout)
    }

    fn save(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        data: &SessionData,
    ) -> Result<(), StorageError> {
        let payload = self.transcoder.encode(data)?;
        let cookie = self.data_cookie(request, payload);

        let size = cookie.to_string().len();
        if size > self.max_cookie_bytes {
            return Err(StorageError::PayloadTooLarge {
                size,
                limit: self.max_cookie_bytes,
            });
        }

        response.set_cookie(cookie);
        Ok(())
    }

    fn get(&self, request: &SessionRequest, id: &str) -> Result<Option<SessionData>, StorageError> {
        let Some(payload) = request.cookie(&self.name) else {
            return Ok(None);
        };

        let log = SessionLog::new(request.request_id());
        let mut data = match self.transcoder.decode(&payload.into_inner()) {
            Ok(data) => data,
            Err(e) => {
                log.warn(format_args!("discarding session cookie '{}': {e}", self.name));
                return Ok(None);
            }
        };

        if data.id() != id {
            log.warn(format_args!(
                "session cookie carries {} but {} was requested",
                fingerprint(data.id()),
                fingerprint(id)
            ));
            return Ok(None);
        }

        if let Some(bound) = self.expiry_bound() {
            let bound = i64::try_from(bound.as_millis()).unwrap_or(i64::MAX);
            if now_millis().saturating_sub(bound) >= data.last_accessed_time() {
                log.info(format_args!(
                    "session cookie for {} has expired",
                    fingerprint(data.id())
                ));
                return Ok(None);
            }
        }

        data.set_max_inactive_interval(self.idle_timeout);
        Ok(Some(data))
    }

    fn delete(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        _id: &str,
    ) -> Result<(), StorageError> {
        let mut cookie = self.data_cookie(request, String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        response.set_cookie(cookie);
        Ok(())
    }
}

impl std::fmt::Debug for CookieSessionDataStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSessionDataStorage")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("domain", &self.domain)
            .field("max_age", &self.max_age)
            .field("max_cookie_bytes", &self.max_cookie_bytes)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}
