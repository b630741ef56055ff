//! Web framework integration surface.
//!
//! This module is the boundary between HTTP frameworks and the session
//! layer. It handles:
//! - Mapping the session-relevant parts of a request to [`SessionRequest`]
//! - Introducing taint at the boundary (cookie values → `Tainted<T>`)
//! - Collecting `Set-Cookie` instructions in [`SessionResponse`]
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: Nothing here names a server or
//!    framework type. Framework glue converts into and out of these types.
//!
//! 2. **Taint at Boundary**: Cookie values leave [`SessionRequest`] only as
//!    `Tainted<String>`; session ids are sanitized before any storage sees them.
//!
//! 3. **Explicit Context**: No global "current request". The request and the
//!    response are passed to every operation that touches the wire.
//!
//! # Integration Model
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, actix):
//! let request = SessionRequest::from_cookie_header(request_id, cookie_header)
//!     .with_context_path(mount_path)
//!     .with_secure(is_tls);
//! let mut response = SessionResponse::new();
//!
//! let body = manager.handle(&request, &mut response, |scope| app(scope))?;
//!
//! for header in response.set_cookie_headers() {
//!     http_response.append("Set-Cookie", header);
//! }
//! ```

mod adapter;
pub mod example_handler;
mod response;

pub use adapter::SessionRequest;
pub use response::SessionResponse;

/// Returns true if `name` can be used as a cookie name.
///
/// Cookie names are RFC 6265 tokens: visible ASCII without separators.
pub(crate) fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}
