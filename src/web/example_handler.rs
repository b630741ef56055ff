//! Example handlers demonstrating the session flow of a web application.
//!
//! These show how request-handling code uses a [`SessionScope`]: logging a
//! user in (with a fresh session id), reading the session on later
//! requests, and logging out.
//!
//! **These examples are for documentation and testing only.**
//! They run inside [`SessionManager::handle`](crate::SessionManager::handle)
//! and need no HTTP infrastructure.

use crate::error::Error;
use crate::logging::{fingerprint, SessionLog};
use crate::SessionScope;

/// Attribute holding the logged-in user name.
pub const USER_KEY: &str = "user";

/// Attribute holding the number of profile views, as JSON.
pub const VIEWS_KEY: &str = "views";

/// Result of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    /// Request ID for tracing
    pub request_id: String,
    /// Logged-in user
    pub user: String,
    /// Whether an earlier session was discarded
    pub replaced_session: bool,
}

/// Logs `user` in.
///
/// Any session the client already had is invalidated first, so the user
/// always gets a fresh id after authenticating.
///
/// # Examples
///
/// ```
/// use session_core::web::{example_handler::handle_login, SessionRequest, SessionResponse};
/// use session_core::{CookieSessionStrategy, MemorySessionDataStorage, SessionManager};
///
/// let manager = SessionManager::new(MemorySessionDataStorage::new(), CookieSessionStrategy::default());
/// let mut response = SessionResponse::new();
///
/// let result = manager
///     .handle(&SessionRequest::new("req-login-001"), &mut response, |scope| {
///         handle_login(scope, "alice")
///     })
///     .expect("login succeeds");
///
/// assert_eq!(result.user, "alice");
/// assert!(response.cookie("SESSIONID").is_some());
/// ```
pub fn handle_login(scope: &mut SessionScope<'_>, user: &str) -> Result<LoginResult, Error> {
    if user.trim().is_empty() {
        return Err(Error::handler("user name is empty"));
    }

    let replaced_session = scope.existing_session().is_some() && scope.invalidate();

    let session = scope.session();
    session.put(USER_KEY, user);
    session
        .put_json(VIEWS_KEY, &0u32)
        .map_err(|e| Error::handler(e.to_string()))?;

    let id = fingerprint(session.id());
    SessionLog::new(scope.request().request_id())
        .info(format_args!("user logged in with session {id}"));

    Ok(LoginResult {
        request_id: scope.request().request_id().to_string(),
        user: user.to_string(),
        replaced_session,
    })
}

/// Result of a profile view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResult {
    /// Request ID for tracing
    pub request_id: String,
    /// Logged-in user
    pub user: String,
    /// Profile views in this session, this one included
    pub views: u32,
}

/// Shows the profile of the logged-in user.
///
/// Never creates a session: without a valid session cookie the request is
/// rejected.
pub fn handle_profile(scope: &mut SessionScope<'_>) -> Result<ProfileResult, Error> {
    let request_id = scope.request().request_id().to_string();

    let session = scope
        .existing_session()
        .ok_or_else(|| Error::handler("not logged in"))?;
    let user = session
        .get(USER_KEY)
        .ok_or_else(|| Error::handler("session has no user"))?
        .to_string();

    let views = session.get_json::<u32>(VIEWS_KEY).unwrap_or(0).saturating_add(1);
    session
        .put_json(VIEWS_KEY, &views)
        .map_err(|e| Error::handler(e.to_string()))?;

    Ok(ProfileResult {
        request_id,
        user,
        views,
    })
}

/// Logs the current user out. Returns false if there was no session.
pub fn handle_logout(scope: &mut SessionScope<'_>) -> Result<bool, Error> {
    if scope.existing_session().is_none() {
        return Ok(false);
    }
    Ok(scope.invalidate())
}
