/// A value that has passed a [`Sanitizer`](crate::Sanitizer).
///
/// Storage lookups by a client-supplied id only accept `Verified<String>`,
/// so a malformed or oversized cookie value never reaches a backend.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<T>` implementation.
/// Construction is restricted to crate-internal sanitizers through
/// `new_unchecked`.
///
/// ```compile_fail
/// use session_core::Verified;
///
/// let verified = Verified::new("data".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without validating it.
    ///
    /// Callers must have validated `value` already.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
