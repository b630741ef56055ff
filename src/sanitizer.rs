use std::fmt;

use crate::{Tainted, Verified};

/// Error returned when a tainted value fails validation.
///
/// The message never echoes the rejected input.
///
/// # Examples
///
/// ```
/// use session_core::{SanitizationError, SanitizationErrorKind};
///
/// let error = SanitizationError::new(SanitizationErrorKind::TooLong, "id exceeds 128 characters");
/// assert_eq!(error.kind(), SanitizationErrorKind::TooLong);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Input is empty.
    Empty,
    /// Input exceeds the maximum allowed length.
    TooLong,
    /// Input contains a character outside the allowed alphabet.
    ForbiddenCharacter,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ForbiddenCharacter => write!(f, "forbidden character"),
        }
    }
}

/// Promotes tainted values to verified values.
///
/// Implementations MUST validate before calling `Verified::new_unchecked`
/// and MUST NOT leak the rejected input in errors.
pub trait Sanitizer<T> {
    /// Sanitizes a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<T>, SanitizationError>;
}

/// Validates client-supplied session ids before they reach a storage backend.
///
/// Accepts non-empty ids of at most `max_len` characters drawn from
/// `[A-Za-z0-9_-]`. Ids minted by [`SessionData::new`](crate::SessionData::new)
/// are 32 lowercase hex characters and always pass.
///
/// # Examples
///
/// ```
/// use session_core::{Sanitizer, SessionIdSanitizer, Tainted};
///
/// let sanitizer = SessionIdSanitizer::default();
///
/// let ok = sanitizer.sanitize(Tainted::new("9f86d081884c7d659a2feaa0c55ad015".to_string()));
/// assert!(ok.is_ok());
///
/// let injected = sanitizer.sanitize(Tainted::new("abc; Path=/admin".to_string()));
/// assert!(injected.is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SessionIdSanitizer {
    max_len: usize,
}

impl SessionIdSanitizer {
    /// Default maximum id length.
    pub const DEFAULT_MAX_LEN: usize = 128;

    /// Creates a sanitizer with the given maximum id length.
    ///
    /// A `max_len` of zero is raised to one.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    /// Returns the maximum accepted id length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for SessionIdSanitizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_LEN)
    }
}

impl Sanitizer<String> for SessionIdSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let candidate = input.peek();

        if candidate.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "session id is empty",
            ));
        }

        if candidate.len() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("session id exceeds {} characters", self.max_len),
            ));
        }

        if !candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ForbiddenCharacter,
                "session id contains characters outside [A-Za-z0-9_-]",
            ));
        }

        Ok(Verified::new_unchecked(input.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(raw: &str) -> Result<Verified<String>, SanitizationError> {
        SessionIdSanitizer::default().sanitize(Tainted::new(raw.to_string()))
    }

    #[test]
    fn accepts_generated_ids() {
        let id = crate::SessionData::new().id().to_string();
        assert_eq!(sanitize(&id).expect("generated id").as_ref(), &id);
    }

    #[test]
    fn rejects_empty() {
        let err = sanitize("").unwrap_err();
        assert_eq!(err.kind(), SanitizationErrorKind::Empty);
    }

    #[test]
    fn rejects_too_long() {
        let err = SessionIdSanitizer::new(8)
            .sanitize(Tainted::new("abcdefghi".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), SanitizationErrorKind::TooLong);
    }

    #[test]
    fn rejects_separators_and_control_chars() {
        for raw in ["a b", "a;b", "a=b", "a\nb", "a/b", "ä"] {
            let err = sanitize(raw).unwrap_err();
            assert_eq!(err.kind(), SanitizationErrorKind::ForbiddenCharacter, "{raw:?}");
        }
    }

    #[test]
    fn error_does_not_leak_input() {
        let err = sanitize("secret;value").unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn zero_max_len_is_raised() {
        assert_eq!(SessionIdSanitizer::new(0).max_len(), 1);
    }
}
