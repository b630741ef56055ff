use std::fmt;

/// Request-scoped logger for the session layer.
///
/// Every event carries the request id so that resolution and commit steps
/// of one request can be correlated. Session ids are never passed to this
/// logger in full; use [`fingerprint`] instead.
#[derive(Debug, Clone, Copy)]
pub struct SessionLog<'a> {
    request_id: &'a str,
}

impl<'a> SessionLog<'a> {
    /// Creates a logger bound to `request_id`.
    pub fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// Returns the request id associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message with request ID.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a warning-level message with request ID.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }

    /// Logs an error-level message with request ID.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a debug-level message with request ID.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }
}

/// Shortens a session id to a loggable fingerprint.
///
/// ```
/// use session_core::fingerprint;
///
/// assert_eq!(fingerprint("0123456789abcdef"), "01234567…");
/// assert_eq!(fingerprint("abc"), "abc");
/// ```
pub fn fingerprint(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((cut, _)) => format!("{}…", &id[..cut]),
        None => id.to_string(),
    }
}
