use thiserror::Error;

/// Errors raised while turning a transported payload back into session data.
///
/// Every variant is recoverable: callers downgrade a `DecodeError` to
/// "no session" and never show it to the application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload is not valid base64.
    #[error("payload is not valid base64")]
    Base64,
    /// The decoded payload could not be parsed.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// A reserved bookkeeping field is absent.
    #[error("missing reserved field '{0}'")]
    MissingField(&'static str),
    /// A reserved bookkeeping field has an unusable value.
    #[error("invalid reserved field '{field}': {reason}")]
    InvalidField {
        /// Name of the field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
    /// The ciphertext could not be decrypted or failed authentication.
    #[error("payload failed decryption")]
    Decryption,
    /// The payload carries no checksum.
    #[error("payload carries no checksum")]
    MissingChecksum,
    /// The recomputed checksum differs from the transported one.
    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// Errors raised while encoding session data.
///
/// Valid session data always encodes; these only surface when the
/// underlying serializer or cipher fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Encryption failed.
    #[error("encryption failed")]
    Encryption,
    /// The checksum could not be computed.
    #[error("checksum computation failed")]
    Checksum,
}

/// Errors raised by a [`SessionDataStorage`](crate::SessionDataStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session could not be encoded for persistence.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A self-contained cookie would exceed the configured size limit.
    #[error("session cookie is {size} bytes, limit is {limit}")]
    PayloadTooLarge {
        /// Size of the rendered cookie in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },
    /// The backing store failed.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Misconfiguration detected while building the session layer.
///
/// These are raised once at startup, never per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is not configured.
    #[error("missing required secret '{0}'")]
    MissingSecret(&'static str),
    /// Key material could not be turned into a cipher key.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    /// A setting has an unusable value.
    #[error("invalid setting: {0}")]
    Invalid(String),
    /// The configuration file is not valid TOML for this schema.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the session crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Persisting or clearing the session failed at commit time.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
    /// The request handler failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Creates a handler error from any displayable cause.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}
