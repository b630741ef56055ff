//! Outgoing cookie instructions collected during commit.

use cookie::Cookie;

/// The `Set-Cookie` instructions the session layer produced for a response.
///
/// Setting a cookie with the same name, path and domain as an earlier one
/// replaces it, so a response never carries two contradicting instructions
/// for one cookie.
///
/// # Examples
///
/// ```
/// use cookie::Cookie;
/// use session_core::web::SessionResponse;
///
/// let mut response = SessionResponse::new();
/// response.set_cookie(Cookie::build(("SESSIONID", "abc")).path("/").http_only(true).build());
///
/// assert_eq!(response.cookie("SESSIONID").map(|c| c.value()), Some("abc"));
/// assert_eq!(response.set_cookie_headers(), vec!["SESSIONID=abc; HttpOnly; Path=/".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionResponse {
    cookies: Vec<Cookie<'static>>,
}

impl SessionResponse {
    /// Creates a response with no cookie instructions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cookie instruction, replacing one for the same cookie.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        if let Some(existing) = self.cookies.iter_mut().find(|c| same_cookie(c, &cookie)) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    /// Returns the last instruction for the cookie named `name`.
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().rev().find(|c| c.name() == name)
    }

    /// Returns every instruction in the order it was first set.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Renders each instruction as a `Set-Cookie` header value.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(|c| c.to_string()).collect()
    }

    /// Returns true if no cookie was set.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn same_cookie(a: &Cookie<'_>, b: &Cookie<'_>) -> bool {
    a.name() == b.name() && a.path() == b.path() && a.domain() == b.domain()
}
