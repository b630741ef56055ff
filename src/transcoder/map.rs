use std::collections::BTreeMap;

use super::{
    decode_base64, encode_base64, SessionDataTranscoder, CREATION_TIME_KEY, ID_KEY, LAST_ACCESS_KEY,
};
use crate::error::{DecodeError, EncodeError};
use crate::SessionData;

/// Encodes a session as one flat string map.
///
/// The map holds every attribute plus the reserved keys `_id`, `_ct`
/// (creation time) and `_la` (last access), times as epoch millis in
/// decimal strings, serialized as a JSON object with sorted keys and
/// base64url encoded. This is the self-contained cookie payload format.
/// The idle interval does not travel; the reading side applies its own.
///
/// A payload without `_la` is read as last accessed at creation.
/// Attributes named like a reserved key are shadowed by the bookkeeping values.
///
/// # Examples
///
/// ```
/// use session_core::{MapSessionDataTranscoder, SessionData, SessionDataTranscoder};
///
/// let mut data = SessionData::new();
/// data.put("user", "alice");
///
/// let payload = MapSessionDataTranscoder.encode(&data).unwrap();
/// let decoded = MapSessionDataTranscoder.decode(&payload).unwrap();
///
/// assert_eq!(decoded.id(), data.id());
/// assert_eq!(decoded.get("user"), Some("alice"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MapSessionDataTranscoder;

impl SessionDataTranscoder for MapSessionDataTranscoder {
    fn encode(&self, data: &SessionData) -> Result<String, EncodeError> {
        let mut map: BTreeMap<&str, String> = data
            .attributes()
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        map.insert(ID_KEY, data.id().to_string());
        map.insert(CREATION_TIME_KEY, data.creation_time().to_string());
        map.insert(LAST_ACCESS_KEY, data.last_accessed_time().to_string());

        let json = serde_json::to_vec(&map).map_err(|e| EncodeError::Serialize(e.to_string()))?;
        Ok(encode_base64(&json))
    }

    fn decode(&self, payload: &str) -> Result<SessionData, DecodeError> {
        let json = decode_base64(payload)?;
        let mut map: BTreeMap<String, String> =
            serde_json::from_slice(&json).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let id = map.remove(ID_KEY).ok_or(DecodeError::MissingField(ID_KEY))?;
        if id.is_empty() {
            return Err(DecodeError::InvalidField {
                field: ID_KEY,
                reason: "empty session id".to_string(),
            });
        }

        let creation_time = map
            .remove(CREATION_TIME_KEY)
            .ok_or(DecodeError::MissingField(CREATION_TIME_KEY))?
            .parse::<i64>()
            .map_err(|e| DecodeError::InvalidField {
                field: CREATION_TIME_KEY,
                reason: e.to_string(),
            })?;

        let last_access = match map.remove(LAST_ACCESS_KEY) {
            None => creation_time,
            Some(raw) => raw.parse::<i64>().map_err(|e| DecodeError::InvalidField {
                field: LAST_ACCESS_KEY,
                reason: e.to_string(),
            })?,
        };

        let mut data = SessionData::restore(id, creation_time, map);
        data.set_last_accessed_time(last_access);
        Ok(data)
    }
}
