use std::fmt;

use serde::{Deserialize, Deserializer};

/// A wrapper that keeps key material out of logs and error output.
///
/// Session keys (the HMAC key and the encryption key) are held as
/// `Secret<String>` from the moment they are read from configuration. The
/// wrapped value can only be reached through
/// [`expose_secret`](Self::expose_secret).
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - Deserializes transparently, so configuration structs can hold secrets
///   directly and still be printed with `{:?}`
///
/// # Examples
///
/// ```
/// use session_core::Secret;
///
/// let hmac_key = Secret::new("0123456789abcdef".to_string());
///
/// assert_eq!(format!("{:?}", hmac_key), "[REDACTED]");
/// assert_eq!(format!("{}", hmac_key), "[REDACTED]");
/// assert_eq!(hmac_key.expose_secret(), "0123456789abcdef");
/// ```
// BREAKING CHANGE WARNING: Do NOT add Clone, Copy, or Default derives.
// Key material must not be duplicated carelessly.
pub struct Secret<T> {
    // BREAKING CHANGE WARNING: This field MUST remain private (CWE-532).
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// # Security Warning
    ///
    /// The name is intentionally loud. Never log or display the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<String> {
    /// Returns true if the wrapped key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }
}

impl<T> fmt::Debug for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug() {
        let key = Secret::new("hunter2".to_string());
        let debug_output = format!("{:?}", key);

        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("String")); // No type leak
    }

    #[test]
    fn secret_redacts_display() {
        let key = Secret::new("sk-1234567890");
        assert_eq!(format!("{}", key), "[REDACTED]");
    }

    #[test]
    fn secret_exposes_when_explicit() {
        let key = Secret::new(vec![1u8, 2, 3]);
        assert_eq!(key.expose_secret(), &vec![1, 2, 3]);
    }

    #[test]
    fn secret_deserializes_transparently() {
        #[derive(Deserialize, Debug)]
        struct Keys {
            hmac_key: Secret<String>,
        }

        let keys: Keys = toml::from_str(r#"hmac_key = "top-secret""#).expect("valid toml");
        assert_eq!(keys.hmac_key.expose_secret(), "top-secret");

        let debug_output = format!("{:?}", keys);
        assert!(!debug_output.contains("top-secret"));
    }

    #[test]
    fn blank_secret_detected() {
        assert!(Secret::new("   ".to_string()).is_blank());
        assert!(!Secret::new("k".to_string()).is_blank());
    }
}
