//! Conversion of [`SessionData`] to and from transportable strings.
//!
//! Plain transcoders ([`JsonSessionDataTranscoder`], [`MapSessionDataTranscoder`])
//! only serialize. [`SignedSessionDataTranscoder`] adds an HMAC checksum under
//! [`CHECKSUM_KEY`], and [`EncryptedSessionDataTranscoder`] additionally
//! encrypts the signed payload with a second key.
//!
//! Every decode failure is a [`DecodeError`]; callers treat it as "no session".

mod encrypted;
mod json;
mod map;
mod signed;

pub use encrypted::{EncryptedSessionDataTranscoder, EncryptedSessionDataTranscoderBuilder};
pub use json::JsonSessionDataTranscoder;
pub use map::MapSessionDataTranscoder;
pub use signed::SignedSessionDataTranscoder;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{DecodeError, EncodeError};
use crate::SessionData;

/// Reserved payload key holding the session id.
pub const ID_KEY: &str = "_id";
/// Reserved payload key holding the creation time in epoch millis.
pub const CREATION_TIME_KEY: &str = "_ct";
/// Reserved payload key holding the last-access time in epoch millis.
pub const LAST_ACCESS_KEY: &str = "_la";
/// Reserved payload key holding the checksum over all other fields.
pub const CHECKSUM_KEY: &str = "_cs";

/// Converts session data to a string payload and back.
///
/// `encode` must be deterministic for a given session (apart from cipher
/// nonces), because checksums are computed over its output.
pub trait SessionDataTranscoder: Send + Sync {
    /// Encodes `data` into a transportable string.
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError>;

    /// Decodes a payload produced by [`encode`](Self::encode).
    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError>;
}

impl<T: SessionDataTranscoder + ?Sized> SessionDataTranscoder for Box<T> {
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError> {
        (**self).encode(data)
    }

    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError> {
        (**self).decode(payload)
    }
}

/// Which plain transcoder to use, for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscoderKind {
    /// [`JsonSessionDataTranscoder`]
    #[default]
    Json,
    /// [`MapSessionDataTranscoder`]
    Map,
}

impl TranscoderKind {
    /// Builds the transcoder for this kind.
    pub fn build(self) -> Box<dyn SessionDataTranscoder> {
        match self {
            TranscoderKind::Json => Box::new(JsonSessionDataTranscoder),
            TranscoderKind::Map => Box::new(MapSessionDataTranscoder),
        }
    }
}

fn encode_base64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD.decode(payload).map_err(|_| DecodeError::Base64)
}
