use std::fmt;

/// A value that arrived from the client and has not been checked yet.
///
/// Everything a session strategy reads off the wire (the session id cookie,
/// for instance) is handed out as `Tainted<T>`. The value cannot be used as
/// a storage key until a [`Sanitizer`](crate::Sanitizer) has promoted it to
/// [`Verified<T>`](crate::Verified).
///
/// # Examples
///
/// ```
/// use session_core::Tainted;
///
/// let requested_id = Tainted::new("../../etc/passwd".to_string());
/// println!("{:?}", requested_id); // Tainted { inner: "../../etc/passwd" }
///
/// // No implicit access:
/// // storage.get(&requested_id); // Won't compile!
/// ```
// BREAKING CHANGE WARNING: Do NOT remove Clone - request adapters hand out
// copies of the same cookie value to several readers.
#[derive(Clone)]
pub struct Tainted<T> {
    // BREAKING CHANGE WARNING: This field MUST remain private (CWE-20).
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Crate-private: only sanitizers may look inside.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Borrows the inner value for sanitizers that validate before copying.
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }
}

// BREAKING CHANGE WARNING: Do NOT add Deref, AsRef, Borrow, From<T>, or Into<T>.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
