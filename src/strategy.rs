//! How the session id travels between client and server.

use cookie::time::Duration as CookieDuration;
use cookie::Cookie;

use crate::web::{SessionRequest, SessionResponse};
use crate::{SessionData, Tainted};

/// Default name of the session id cookie.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "SESSIONID";

/// Carries the session id between client and server.
///
/// The strategy only reads and writes the transport; it never decides
/// whether a session is valid.
pub trait SessionStrategy: Send + Sync {
    /// Returns the session id the client presented, if any.
    fn requested_session_id(&self, request: &SessionRequest) -> Option<Tainted<String>>;

    /// Tells the client to use the id of `data` from now on.
    fn on_new_session(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        data: &SessionData,
    );

    /// Tells the client to forget its session id.
    fn on_invalidated_session(&self, request: &SessionRequest, response: &mut SessionResponse);
}

/// Carries the session id in an HTTP cookie.
///
/// The cookie is `HttpOnly`, `Secure` when the request was secure, and
/// scoped to the request's context path unless a fixed path is configured.
///
/// # Examples
///
/// ```
/// use session_core::web::{SessionRequest, SessionResponse};
/// use session_core::{CookieSessionStrategy, SessionData, SessionStrategy};
///
/// let strategy = CookieSessionStrategy::default();
/// let request = SessionRequest::new("req-1").with_context_path("/app");
/// let mut response = SessionResponse::new();
///
/// let data = SessionData::new();
/// strategy.on_new_session(&request, &mut response, &data);
///
/// let header = &response.set_cookie_headers()[0];
/// assert!(header.starts_with(&format!("SESSIONID={}", data.id())));
/// assert!(header.contains("HttpOnly"));
/// assert!(header.contains("Path=/app/"));
/// ```
#[derive(Debug, Clone)]
pub struct CookieSessionStrategy {
    name: String,
    path: Option<String>,
    domain: Option<String>,
}

impl CookieSessionStrategy {
    /// Creates a strategy using the cookie `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            domain: None,
        }
    }

    /// Uses a fixed cookie path instead of the request's context path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Returns the cookie name.
    pub fn cookie_name(&self) -> &str {
        &self.name
    }

    fn session_cookie(&self, request: &SessionRequest, value: String) -> Cookie<'static> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| request.cookie_path());

        let mut builder = Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(request.is_secure())
            .path(path);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

impl Default for CookieSessionStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_COOKIE_NAME)
    }
}

impl SessionStrategy for CookieSessionStrategy {
    fn requested_session_id(&self, request: &SessionRequest) -> Option<Tainted<String>> {
        request.cookie(&self.name)
    }

    fn on_new_session(
        &self,
        request: &SessionRequest,
        response: &mut SessionResponse,
        data: &SessionData,
    ) {
        response.set_cookie(self.session_cookie(request, data.id().to_string()));
    }

    fn on_invalidated_session(&self, request: &SessionRequest, response: &mut SessionResponse) {
        let mut cookie = self.session_cookie(request, String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        response.set_cookie(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_matching_cookie() {
        let strategy = CookieSessionStrategy::default();
        let request = SessionRequest::from_cookie_header("req-1", "SESSIONID=one; SESSIONID=two");

        let id = strategy.requested_session_id(&request).map(|t| t.into_inner());
        assert_eq!(id, Some("one".to_string()));
    }

    #[test]
    fn absent_cookie_is_none() {
        let strategy = CookieSessionStrategy::new("sid");
        let request = SessionRequest::from_cookie_header("req-1", "SESSIONID=one");
        assert!(strategy.requested_session_id(&request).is_none());
    }

    #[test]
    fn secure_mirrors_request() {
        let strategy = CookieSessionStrategy::default();
        let data = SessionData::new();

        let mut plain = SessionResponse::new();
        strategy.on_new_session(&SessionRequest::new("req-1"), &mut plain, &data);
        assert_eq!(plain.cookie("SESSIONID").and_then(|c| c.secure()), Some(false));

        let mut tls = SessionResponse::new();
        strategy.on_new_session(&SessionRequest::new("req-2").with_secure(true), &mut tls, &data);
        assert_eq!(tls.cookie("SESSIONID").and_then(|c| c.secure()), Some(true));
    }

    #[test]
    fn invalidation_expires_cookie() {
        let strategy = CookieSessionStrategy::default();
        let request = SessionRequest::new("req-1");
        let mut response = SessionResponse::new();

        strategy.on_invalidated_session(&request, &mut response);

        let cookie = response.cookie("SESSIONID").expect("cookie set");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        assert!(response.set_cookie_headers()[0].contains("Max-Age=0"));
    }

    #[test]
    fn fixed_path_and_domain() {
        let strategy = CookieSessionStrategy::new("sid")
            .with_path("/")
            .with_domain("example.com");
        let request = SessionRequest::new("req-1").with_context_path("/app");
        let mut response = SessionResponse::new();

        strategy.on_new_session(&request, &mut response, &SessionData::new());

        let cookie = response.cookie("sid").expect("cookie set");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(strategy.cookie_name(), "sid");
    }
}
