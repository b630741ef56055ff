//! Cookie-carried HTTP sessions with pluggable storage.
//!
//! This crate provides a server-side session API whose state actually
//! lives either in a signed (optionally encrypted) cookie or in a
//! server-side store keyed by an id cookie:
//! - **Session data**: an id, timestamps and a string attribute map
//! - **Transcoding**: turning session data into a tamper-evident string
//! - **Storage**: create/save/get/delete backends (cookie, memory, key/value)
//! - **Strategy**: carrying the session id in a cookie
//! - **Manager**: lazy per-request resolution and an explicit commit step
//!
//! # Core Types
//!
//! - [`SessionManager`]: built once at startup, opens a [`SessionScope`] per request
//! - [`SessionScope`]: the session-aware view of a request
//! - [`Session`]: the handle application code reads and writes
//! - [`Secret<T>`]: wrapper that redacts key material in logs/output
//! - [`Tainted<T>`]: wrapper for client-supplied values requiring sanitization
//!
//! # Examples
//!
//! ```
//! use session_core::web::{SessionRequest, SessionResponse};
//! use session_core::{CookieSessionStrategy, MemorySessionDataStorage, SessionManager};
//!
//! let manager = SessionManager::new(MemorySessionDataStorage::new(), CookieSessionStrategy::default());
//!
//! // First request: no cookie, a session is created on demand.
//! let first = SessionRequest::new("req-1");
//! let mut response = SessionResponse::new();
//! manager
//!     .handle(&first, &mut response, |scope| {
//!         scope.session().put("user", "alice");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! // The client sends the id cookie back.
//! let id = response.cookie("SESSIONID").unwrap().value().to_string();
//! let second = SessionRequest::from_cookie_header("req-2", &format!("SESSIONID={id}"));
//!
//! let user = manager
//!     .handle(&second, &mut SessionResponse::new(), |scope| {
//!         Ok(scope.existing_session().and_then(|s| s.get("user").map(str::to_string)))
//!     })
//!     .unwrap();
//! assert_eq!(user.as_deref(), Some("alice"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod crypto;
mod data;
mod error;
mod logging;
mod manager;
mod sanitizer;
mod secret;
mod session;
mod storage;
mod strategy;
mod tainted;
mod transcoder;
mod verified;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use config::{CookieStoreConfig, SessionConfig};
pub use crypto::{AesGcmEncryptor, ChecksumAlgorithm, Encryptor, EncryptorKind};
pub use data::{SessionData, DEFAULT_MAX_INACTIVE_INTERVAL};
pub use error::{ConfigError, DecodeError, EncodeError, Error, StorageError};
pub use logging::{fingerprint, SessionLog};
pub use manager::{CommitOutcome, Resolution, SessionManager, SessionScope};
pub use sanitizer::{SanitizationError, SanitizationErrorKind, Sanitizer, SessionIdSanitizer};
pub use secret::Secret;
pub use session::Session;
pub use storage::{
    CookieSessionDataStorage, KeyValueSessionDataStorage, KeyValueStore, MemoryKeyValueStore,
    MemorySessionDataStorage, SessionDataStorage, StorageKind, DEFAULT_DATA_COOKIE_NAME,
    DEFAULT_MAX_COOKIE_BYTES,
};
pub use strategy::{CookieSessionStrategy, SessionStrategy, DEFAULT_SESSION_COOKIE_NAME};
pub use tainted::Tainted;
pub use transcoder::{
    EncryptedSessionDataTranscoder, EncryptedSessionDataTranscoderBuilder,
    JsonSessionDataTranscoder, MapSessionDataTranscoder, SessionDataTranscoder,
    SignedSessionDataTranscoder, TranscoderKind, CHECKSUM_KEY, CREATION_TIME_KEY, ID_KEY,
    LAST_ACCESS_KEY,
};
pub use verified::Verified;
