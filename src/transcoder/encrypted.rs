use std::fmt;

use super::{JsonSessionDataTranscoder, SessionDataTranscoder, SignedSessionDataTranscoder};
use crate::crypto::{ChecksumAlgorithm, Encryptor, EncryptorKind};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::{Secret, SessionData};

/// Signs and then encrypts session payloads.
///
/// The payload is the [`SignedSessionDataTranscoder`] output of the inner
/// transcoder, encrypted with the configured [`Encryptor`]. Decoding
/// decrypts first and then verifies the checksum, so a payload must pass
/// both keys to yield a session.
///
/// Build one with [`EncryptedSessionDataTranscoder::builder`].
///
/// # Examples
///
/// ```
/// use session_core::{EncryptedSessionDataTranscoder, Secret, SessionData, SessionDataTranscoder};
///
/// let transcoder = EncryptedSessionDataTranscoder::builder()
///     .secret_key(Secret::new("encryption-secret".to_string()))
///     .hmac_key(Secret::new("signing-secret".to_string()))
///     .build()
///     .unwrap();
///
/// let mut data = SessionData::new();
/// data.put("user", "alice");
///
/// let payload = transcoder.encode(&data).unwrap();
/// assert!(!payload.contains("alice"));
/// assert_eq!(transcoder.decode(&payload).unwrap().get("user"), Some("alice"));
/// ```
pub struct EncryptedSessionDataTranscoder {
    signed: SignedSessionDataTranscoder<Box<dyn SessionDataTranscoder>>,
    encryptor: Box<dyn Encryptor>,
}

impl EncryptedSessionDataTranscoder {
    /// Starts a builder. Only the secret key is required.
    pub fn builder() -> EncryptedSessionDataTranscoderBuilder {
        EncryptedSessionDataTranscoderBuilder::default()
    }
}

impl SessionDataTranscoder for EncryptedSessionDataTranscoder {
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError> {
        let signed = self.signed.encode(data)?;
        self.encryptor.encrypt(&signed)
    }

    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError> {
        let signed = self.encryptor.decrypt(payload)?;
        self.signed.decode(&signed)
    }
}

impl fmt::Debug for EncryptedSessionDataTranscoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedSessionDataTranscoder")
            .field("signed", &self.signed)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EncryptedSessionDataTranscoder`].
///
/// Defaults: the HMAC key falls back to the secret key, the cipher is
/// AES-256-GCM, the checksum is HMAC-SHA256 and the inner transcoder is
/// [`JsonSessionDataTranscoder`].
#[derive(Default)]
pub struct EncryptedSessionDataTranscoderBuilder {
    secret_key: Option<Secret<String>>,
    hmac_key: Option<Secret<String>>,
    encryptor: Option<Box<dyn Encryptor>>,
    encryptor_kind: EncryptorKind,
    checksum: ChecksumAlgorithm,
    transcoder: Option<Box<dyn SessionDataTranscoder>>,
}

impl EncryptedSessionDataTranscoderBuilder {
    /// Sets the encryption secret.
    pub fn secret_key(mut self, key: Secret<String>) -> Self {
        self.secret_key = Some(key);
        self
    }

    /// Sets a separate signing key.
    pub fn hmac_key(mut self, key: Secret<String>) -> Self {
        self.hmac_key = Some(key);
        self
    }

    /// Selects the built-in cipher.
    pub fn encryptor_kind(mut self, kind: EncryptorKind) -> Self {
        self.encryptor_kind = kind;
        self
    }

    /// Supplies a custom cipher, overriding [`encryptor_kind`](Self::encryptor_kind).
    pub fn encryptor(mut self, encryptor: Box<dyn Encryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Selects the checksum algorithm.
    pub fn checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum = algorithm;
        self
    }

    /// Sets the inner plain transcoder.
    pub fn transcoder(mut self, transcoder: Box<dyn SessionDataTranscoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// Builds the transcoder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when the secret key is absent
    /// or blank, or when an explicit HMAC key is blank.
    pub fn build(self) -> Result<EncryptedSessionDataTranscoder, ConfigError> {
        let secret_key = self
            .secret_key
            .filter(|k| !k.is_blank())
            .ok_or(ConfigError::MissingSecret("secret_key"))?;

        let hmac_key = match self.hmac_key {
            Some(key) if key.is_blank() => return Err(ConfigError::MissingSecret("hmac_key")),
            Some(key) => key,
            None => Secret::new(secret_key.expose_secret().clone()),
        };

        let encryptor = match self.encryptor {
            Some(encryptor) => encryptor,
            None => self.encryptor_kind.build(&secret_key)?,
        };

        let inner = self
            .transcoder
            .unwrap_or_else(|| Box::new(JsonSessionDataTranscoder));

        Ok(EncryptedSessionDataTranscoder {
            signed: SignedSessionDataTranscoder::with_algorithm(inner, hmac_key, self.checksum),
            encryptor,
        })
    }
}

impl fmt::Debug for EncryptedSessionDataTranscoderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedSessionDataTranscoderBuilder")
            .field("secret_key", &self.secret_key)
            .field("hmac_key", &self.hmac_key)
            .field("encryptor_kind", &self.encryptor_kind)
            .field("checksum", &self.checksum)
            .finish_non_exhaustive()
    }
}
