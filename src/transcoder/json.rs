use super::{decode_base64, encode_base64, SessionDataTranscoder};
use crate::error::{DecodeError, EncodeError};
use crate::SessionData;

/// Serializes the whole [`SessionData`] record as JSON, base64url encoded.
///
/// Keeps the idle bookkeeping (last access, idle interval) along with the
/// attributes, which is what server-side stores need.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSessionDataTranscoder;

impl SessionDataTranscoder for JsonSessionDataTranscoder {
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError> {
        let json = serde_json::to_vec(data).map_err(|e| EncodeError::Serialize(e.to_string()))?;
        Ok(encode_base64(&json))
    }

    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError> {
        let json = decode_base64(payload)?;
        let data: SessionData =
            serde_json::from_slice(&json).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if data.id().is_empty() {
            return Err(DecodeError::InvalidField {
                field: super::ID_KEY,
                reason: "empty session id".to_string(),
            });
        }

        Ok(data)
    }
}
