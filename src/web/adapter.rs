//! Request adapter for mapping HTTP requests to session-layer types.

use cookie::Cookie;

use crate::Tainted;

/// The parts of an incoming HTTP request the session layer reads.
///
/// `SessionRequest` is the integration point between web frameworks and
/// the session layer. It holds simple owned data so that it does not couple
/// to any framework's request type; framework glue builds one per request
/// from the raw `Cookie` header, the context path the application is
/// mounted under, and whether the connection is secure.
///
/// Cookie values are only handed out as [`Tainted<String>`].
///
/// # Examples
///
/// ```
/// use session_core::web::SessionRequest;
///
/// let request = SessionRequest::from_cookie_header("req-12345", "theme=dark; SESSIONID=abc123")
///     .with_context_path("/shop")
///     .with_secure(true);
///
/// assert_eq!(request.request_id(), "req-12345");
/// assert_eq!(request.cookie_path(), "/shop/");
/// assert!(request.cookie("SESSIONID").is_some());
/// assert!(request.cookie("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    /// Unique request identifier, used to correlate log events
    request_id: String,
    /// Path the application is mounted under, without trailing slash
    context_path: String,
    /// Whether the request arrived over a secure channel
    secure: bool,
    /// Cookies in arrival order (all tainted on extraction)
    cookies: Vec<(String, String)>,
}

impl SessionRequest {
    /// Creates a request with no cookies, mounted at the root, not secure.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Creates a request from the raw value of a `Cookie` header.
    ///
    /// Pairs that do not parse are skipped.
    pub fn from_cookie_header(request_id: impl Into<String>, header: &str) -> Self {
        let mut request = Self::new(request_id);
        for cookie in Cookie::split_parse(header).flatten() {
            request.add_cookie(cookie.name(), cookie.value());
        }
        request
    }

    /// Sets the context path. A trailing slash is dropped.
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        let mut path: String = context_path.into();
        while path.ends_with('/') {
            path.pop();
        }
        self.context_path = path;
        self
    }

    /// Marks the request as received over a secure channel.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Appends a cookie as if it had been sent by the client.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.push((name.into(), value.into()));
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the context path, empty for the root.
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Returns the default cookie path: the context path plus `/`.
    pub fn cookie_path(&self) -> String {
        format!("{}/", self.context_path)
    }

    /// Returns true if the request arrived over a secure channel.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns the value of the first cookie named `name`.
    pub fn cookie(&self, name: &str) -> Option<Tainted<String>> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| Tainted::new(v.clone()))
    }

    /// Returns the number of cookies sent with the request.
    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_is_bare() {
        let request = SessionRequest::new("req-test");
        assert_eq!(request.request_id(), "req-test");
        assert_eq!(request.context_path(), "");
        assert_eq!(request.cookie_path(), "/");
        assert!(!request.is_secure());
        assert_eq!(request.cookie_count(), 0);
    }

    #[test]
    fn parses_cookie_header() {
        let request = SessionRequest::from_cookie_header("req-1", "a=1; b=2;c=3");
        assert_eq!(request.cookie_count(), 3);
        assert_eq!(request.cookie("b").map(|t| t.into_inner()), Some("2".to_string()));
    }

    #[test]
    fn first_cookie_with_name_wins() {
        let request = SessionRequest::from_cookie_header("req-1", "SESSIONID=first; SESSIONID=second");
        assert_eq!(
            request.cookie("SESSIONID").map(|t| t.into_inner()),
            Some("first".to_string())
        );
    }

    #[test]
    fn skips_unparseable_pairs() {
        let request = SessionRequest::from_cookie_header("req-1", "ok=1; =novalue; alsook=2");
        assert!(request.cookie("ok").is_some());
        assert!(request.cookie("alsook").is_some());
    }

    #[test]
    fn context_path_trailing_slash_is_dropped() {
        let request = SessionRequest::new("req-1").with_context_path("/app/");
        assert_eq!(request.context_path(), "/app");
        assert_eq!(request.cookie_path(), "/app/");
    }

    #[test]
    fn empty_header_has_no_cookies() {
        let request = SessionRequest::from_cookie_header("req-1", "");
        assert_eq!(request.cookie_count(), 0);
    }
}
