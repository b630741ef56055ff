//! Integrity and confidentiality primitives for session payloads.
//!
//! Checksums are HMACs rendered as lowercase hex. Encryption is AES-GCM with
//! a random 96-bit nonce prepended to the ciphertext, the whole rendered as
//! unpadded base64url so it can travel in a cookie value unescaped.

use std::fmt;

use aes_gcm::aead::generic_array::{typenum::Unsigned, GenericArray};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Sha256, Sha512};

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::Secret;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

const KDF_SALT: &[u8] = b"session-core/cookie-encryption";
const KDF_INFO: &[u8] = b"aes-gcm session payload key";

/// Symmetric cipher applied to encoded session payloads.
///
/// Implementations own their key; construct them once at startup.
pub trait Encryptor: Send + Sync {
    /// Encrypts `plaintext` into a cookie-safe string.
    fn encrypt(&self, plaintext: &str) -> Result<String, EncodeError>;

    /// Decrypts a string produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`DecodeError::Decryption`] on malformed or tampered input.
    fn decrypt(&self, ciphertext: &str) -> Result<String, DecodeError>;
}

/// Cipher choice for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptorKind {
    /// AES-128 in GCM mode.
    Aes128Gcm,
    /// AES-256 in GCM mode.
    #[default]
    Aes256Gcm,
}

impl EncryptorKind {
    /// Builds the encryptor for this kind, deriving its key from `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] for a blank secret.
    pub fn build(self, secret: &Secret<String>) -> Result<Box<dyn Encryptor>, ConfigError> {
        Ok(Box::new(AesGcmEncryptor::new(self, secret)?))
    }
}

enum AesGcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM [`Encryptor`] keyed through HKDF-SHA256.
///
/// The configured secret may be any non-blank string; the cipher key is
/// derived from it, so the same secret always yields the same key.
///
/// # Examples
///
/// ```
/// use session_core::{AesGcmEncryptor, Encryptor, EncryptorKind, Secret};
///
/// let secret = Secret::new("change-me-in-production".to_string());
/// let encryptor = AesGcmEncryptor::new(EncryptorKind::Aes256Gcm, &secret).unwrap();
///
/// let sealed = encryptor.encrypt("user=alice").unwrap();
/// assert_ne!(sealed, "user=alice");
/// assert_eq!(encryptor.decrypt(&sealed).unwrap(), "user=alice");
/// ```
pub struct AesGcmEncryptor {
    kind: EncryptorKind,
    cipher: AesGcmCipher,
}

impl AesGcmEncryptor {
    /// Creates an encryptor whose key is derived from `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] for a blank secret and
    /// [`ConfigError::InvalidKey`] if key derivation fails.
    pub fn new(kind: EncryptorKind, secret: &Secret<String>) -> Result<Self, ConfigError> {
        if secret.is_blank() {
            return Err(ConfigError::MissingSecret("secret_key"));
        }

        let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), secret.expose_secret().as_bytes());
        let invalid_key = |e: &dyn fmt::Display| ConfigError::InvalidKey(e.to_string());

        let cipher = match kind {
            EncryptorKind::Aes128Gcm => {
                let mut okm = [0u8; 16];
                hk.expand(KDF_INFO, &mut okm).map_err(|e| invalid_key(&e))?;
                AesGcmCipher::Aes128(Aes128Gcm::new_from_slice(&okm).map_err(|e| invalid_key(&e))?)
            }
            EncryptorKind::Aes256Gcm => {
                let mut okm = [0u8; 32];
                hk.expand(KDF_INFO, &mut okm).map_err(|e| invalid_key(&e))?;
                AesGcmCipher::Aes256(Aes256Gcm::new_from_slice(&okm).map_err(|e| invalid_key(&e))?)
            }
        };

        Ok(Self { kind, cipher })
    }

    /// Returns the cipher variant.
    pub fn kind(&self) -> EncryptorKind {
        self.kind
    }
}

impl fmt::Debug for AesGcmEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEncryptor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Encryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncodeError> {
        let sealed = match &self.cipher {
            AesGcmCipher::Aes128(cipher) => seal(cipher, plaintext.as_bytes())?,
            AesGcmCipher::Aes256(cipher) => seal(cipher, plaintext.as_bytes())?,
        };
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, DecodeError> {
        let sealed = URL_SAFE_NO_PAD
            .decode(ciphertext)
            .map_err(|_| DecodeError::Decryption)?;
        let plaintext = match &self.cipher {
            AesGcmCipher::Aes128(cipher) => open(cipher, &sealed)?,
            AesGcmCipher::Aes256(cipher) => open(cipher, &sealed)?,
        };
        String::from_utf8(plaintext).map_err(|_| DecodeError::Decryption)
    }
}

fn seal<C: Aead>(cipher: &C, plaintext: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let nonce = C::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| EncodeError::Encryption)?;

    let mut sealed = Vec::with_capacity(nonce.len() + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open<C: Aead>(cipher: &C, sealed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let nonce_len = <<C as AeadCore>::NonceSize as Unsigned>::USIZE;
    if sealed.len() < nonce_len {
        return Err(DecodeError::Decryption);
    }

    let (nonce, ciphertext) = sealed.split_at(nonce_len);
    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| DecodeError::Decryption)
}

/// Keyed checksum used to authenticate session payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    HmacSha256,
    /// HMAC with SHA-512.
    HmacSha512,
}

impl ChecksumAlgorithm {
    /// Computes the checksum of `message` as lowercase hex.
    pub fn sign(self, key: &[u8], message: &[u8]) -> Result<String, EncodeError> {
        let digest = match self {
            ChecksumAlgorithm::HmacSha256 => mac_for::<HmacSha256>(key, message)
                .map(|mac| mac.finalize().into_bytes().to_vec()),
            ChecksumAlgorithm::HmacSha512 => mac_for::<HmacSha512>(key, message)
                .map(|mac| mac.finalize().into_bytes().to_vec()),
        }
        .ok_or(EncodeError::Checksum)?;

        Ok(hex::encode(digest))
    }

    /// Checks `checksum` (lowercase or uppercase hex) against `message`.
    ///
    /// The comparison runs in constant time.
    pub fn verify(self, key: &[u8], message: &[u8], checksum: &str) -> Result<(), DecodeError> {
        let expected = hex::decode(checksum).map_err(|_| DecodeError::ChecksumMismatch)?;

        let verified = match self {
            ChecksumAlgorithm::HmacSha256 => mac_for::<HmacSha256>(key, message)
                .map(|mac| mac.verify_slice(&expected).is_ok()),
            ChecksumAlgorithm::HmacSha512 => mac_for::<HmacSha512>(key, message)
                .map(|mac| mac.verify_slice(&expected).is_ok()),
        };

        match verified {
            Some(true) => Ok(()),
            _ => Err(DecodeError::ChecksumMismatch),
        }
    }
}

fn mac_for<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Option<M> {
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    mac.update(message);
    Some(mac)
}
