use super::{SessionDataTranscoder, CHECKSUM_KEY};
use crate::crypto::ChecksumAlgorithm;
use crate::error::{DecodeError, EncodeError};
use crate::{Secret, SessionData};

/// Adds an HMAC checksum to the payload of an inner transcoder.
///
/// Encoding computes the HMAC of `inner.encode(data)`, stores it as hex
/// under `_cs`, and encodes again with the checksum included. Decoding
/// strips `_cs`, re-encodes the rest and compares checksums in constant
/// time. The inner encoding must therefore be deterministic.
///
/// The payload is readable by the client but cannot be altered without the
/// HMAC key.
pub struct SignedSessionDataTranscoder<T> {
    inner: T,
    hmac_key: Secret<String>,
    algorithm: ChecksumAlgorithm,
}

impl<T: SessionDataTranscoder> SignedSessionDataTranscoder<T> {
    /// Wraps `inner`, signing with `hmac_key` using HMAC-SHA256.
    pub fn new(inner: T, hmac_key: Secret<String>) -> Self {
        Self::with_algorithm(inner, hmac_key, ChecksumAlgorithm::default())
    }

    /// Wraps `inner` with an explicit checksum algorithm.
    pub fn with_algorithm(inner: T, hmac_key: Secret<String>, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            inner,
            hmac_key,
            algorithm,
        }
    }

    fn checksum(&self, data: &SessionData) -> Result<String, EncodeError> {
        let encoded = self.inner.encode(data)?;
        self.algorithm
            .sign(self.hmac_key.expose_secret().as_bytes(), encoded.as_bytes())
    }
}

impl<T: SessionDataTranscoder> SessionDataTranscoder for SignedSessionDataTranscoder<T> {
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError> {
        let mut signed = data.clone();
        signed.remove(CHECKSUM_KEY);

        let checksum = self.checksum(&signed)?;
        signed.put(CHECKSUM_KEY, checksum);

        self.inner.encode(&signed)
    }

    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError> {
        let mut data = self.inner.decode(payload)?;

        let checksum = data
            .remove(CHECKSUM_KEY)
            .filter(|c| !c.is_empty())
            .ok_or(DecodeError::MissingChecksum)?;

        let canonical = self
            .inner
            .encode(&data)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        self.algorithm.verify(
            self.hmac_key.expose_secret().as_bytes(),
            canonical.as_bytes(),
            &checksum,
        )?;

        Ok(data)
    }
}

impl<T> std::fmt::Debug for SignedSessionDataTranscoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedSessionDataTranscoder")
            .field("algorithm", &self.algorithm)
            .field("hmac_key", &self.hmac_key)
            .finish_non_exhaustive()
    }
}
