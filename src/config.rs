//! Startup configuration for the session layer.
//!
//! Loaded from TOML. Every setting has a default except the signing key of
//! the cookie store, which must be given when `storage = "cookie"`.
//!
//! ```toml
//! cookie_name = "SESSIONID"
//! idle_timeout_secs = 1800
//! storage = "cookie"
//!
//! [cookie_store]
//! hmac_key = "change-me"
//! secret_key = "change-me-too"
//! max_age_secs = 86400
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::crypto::{ChecksumAlgorithm, EncryptorKind};
use crate::error::ConfigError;
use crate::storage::{
    CookieSessionDataStorage, KeyValueSessionDataStorage, MemoryKeyValueStore,
    MemorySessionDataStorage, SessionDataStorage, StorageKind, DEFAULT_DATA_COOKIE_NAME,
    DEFAULT_MAX_COOKIE_BYTES,
};
use crate::strategy::{CookieSessionStrategy, DEFAULT_SESSION_COOKIE_NAME};
use crate::transcoder::{
    EncryptedSessionDataTranscoder, SessionDataTranscoder, SignedSessionDataTranscoder,
    TranscoderKind,
};
use crate::web::is_valid_cookie_name;
use crate::Secret;

/// Top-level session settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
    /// Fixed path for the id cookie. Defaults to the request context path.
    pub cookie_path: Option<String>,
    /// Domain for the id cookie.
    pub cookie_domain: Option<String>,
    /// Idle interval for new sessions in seconds; `0` disables idle expiry.
    pub idle_timeout_secs: u64,
    /// Which backend persists sessions.
    pub storage: StorageKind,
    /// Payload format. Defaults to `map` for cookie storage, `json` otherwise.
    pub transcoder: Option<TranscoderKind>,
    /// Settings of the self-contained cookie storage.
    pub cookie_store: CookieStoreConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            cookie_path: None,
            cookie_domain: None,
            idle_timeout_secs: 30 * 60,
            storage: StorageKind::default(),
            transcoder: None,
            cookie_store: CookieStoreConfig::default(),
        }
    }
}

/// Settings of [`CookieSessionDataStorage`].
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieStoreConfig {
    /// Name of the cookie carrying the payload.
    pub name: String,
    /// Signing key. Required for cookie storage.
    pub hmac_key: Option<Secret<String>>,
    /// Encryption key. Payloads are encrypted when set.
    pub secret_key: Option<Secret<String>>,
    /// Cipher used with `secret_key`.
    pub encryptor: EncryptorKind,
    /// Checksum algorithm used with `hmac_key`.
    pub checksum: ChecksumAlgorithm,
    /// `Max-Age` of the payload cookie; absent means a browser-session cookie.
    pub max_age_secs: Option<u64>,
    /// Path of the payload cookie.
    pub path: String,
    /// Domain of the payload cookie.
    pub domain: Option<String>,
    /// Largest rendered payload cookie accepted at save.
    pub max_cookie_bytes: usize,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATA_COOKIE_NAME.to_string(),
            hmac_key: None,
            secret_key: None,
            encryptor: EncryptorKind::default(),
            checksum: ChecksumAlgorithm::default(),
            max_age_secs: None,
            path: "/".to_string(),
            domain: None,
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
        }
    }
}

impl SessionConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Returns the idle interval for new sessions.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Checks settings that would otherwise fail per request.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unusable cookie names or paths
    /// and [`ConfigError::MissingSecret`] for a missing cookie signing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_cookie_name(&self.cookie_name) {
            return Err(ConfigError::Invalid(format!(
                "cookie_name '{}' is not a valid cookie name",
                self.cookie_name
            )));
        }
        if let Some(path) = &self.cookie_path {
            check_path("cookie_path", path)?;
        }

        if self.storage != StorageKind::Cookie {
            return Ok(());
        }

        let store = &self.cookie_store;
        if !is_valid_cookie_name(&store.name) {
            return Err(ConfigError::Invalid(format!(
                "cookie_store.name '{}' is not a valid cookie name",
                store.name
            )));
        }
        if store.name == self.cookie_name {
            return Err(ConfigError::Invalid(
                "cookie_store.name must differ from cookie_name".to_string(),
            ));
        }
        check_path("cookie_store.path", &store.path)?;
        if store.max_cookie_bytes == 0 {
            return Err(ConfigError::Invalid(
                "cookie_store.max_cookie_bytes must be positive".to_string(),
            ));
        }
        match &store.hmac_key {
            Some(key) if !key.is_blank() => Ok(()),
            _ => Err(ConfigError::MissingSecret("hmac_key")),
        }
    }

    /// Builds the id transport.
    pub fn build_strategy(&self) -> CookieSessionStrategy {
        let mut strategy = CookieSessionStrategy::new(self.cookie_name.clone());
        if let Some(path) = &self.cookie_path {
            strategy = strategy.with_path(path.clone());
        }
        if let Some(domain) = &self.cookie_domain {
            strategy = strategy.with_domain(domain.clone());
        }
        strategy
    }

    /// Builds the storage backend, consuming the configured secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when cookie storage lacks a
    /// signing key, or any error from building the cipher.
    pub fn build_storage(self) -> Result<Arc<dyn SessionDataStorage>, ConfigError> {
        let idle_timeout = self.idle_timeout();

        let storage: Arc<dyn SessionDataStorage> = match self.storage {
            StorageKind::Memory => Arc::new(MemorySessionDataStorage::with_idle_timeout(idle_timeout)),
            StorageKind::KeyValue => {
                let transcoder = self.transcoder.unwrap_or(TranscoderKind::Json).build();
                Arc::new(
                    KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())
                        .with_transcoder(transcoder)
                        .with_idle_timeout(idle_timeout),
                )
            }
            StorageKind::Cookie => {
                let inner = self.transcoder.unwrap_or(TranscoderKind::Map).build();
                let store = self.cookie_store;
                let transcoder = cookie_transcoder(
                    inner,
                    store.hmac_key,
                    store.secret_key,
                    store.encryptor,
                    store.checksum,
                )?;

                let mut storage = CookieSessionDataStorage::new(transcoder)
                    .with_name(store.name)
                    .with_path(store.path)
                    .with_max_age(store.max_age_secs.map(Duration::from_secs))
                    .with_max_cookie_bytes(store.max_cookie_bytes)
                    .with_idle_timeout(idle_timeout);
                if let Some(domain) = store.domain {
                    storage = storage.with_domain(domain);
                }
                Arc::new(storage)
            }
        };

        Ok(storage)
    }
}

fn cookie_transcoder(
    inner: Box<dyn SessionDataTranscoder>,
    hmac_key: Option<Secret<String>>,
    secret_key: Option<Secret<String>>,
    encryptor: EncryptorKind,
    checksum: ChecksumAlgorithm,
) -> Result<Box<dyn SessionDataTranscoder>, ConfigError> {
    let hmac_key = hmac_key
        .filter(|k| !k.is_blank())
        .ok_or(ConfigError::MissingSecret("hmac_key"))?;

    match secret_key {
        Some(secret_key) => Ok(Box::new(
            EncryptedSessionDataTranscoder::builder()
                .secret_key(secret_key)
                .hmac_key(hmac_key)
                .encryptor_kind(encryptor)
                .checksum(checksum)
                .transcoder(inner)
                .build()?,
        )),
        None => Ok(Box::new(SignedSessionDataTranscoder::with_algorithm(
            inner, hmac_key, checksum,
        ))),
    }
}

fn check_path(setting: &str, path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') && !path.contains(';') {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{setting} '{path}' must start with '/' and contain no ';'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = SessionConfig::from_toml_str("").expect("parses");

        assert_eq!(config.cookie_name, "SESSIONID");
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(1800)));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.cookie_store.name, "SESSION_DATA");
        assert_eq!(config.cookie_store.max_cookie_bytes, 4096);
        assert_eq!(config.cookie_store.encryptor, EncryptorKind::Aes256Gcm);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_cookie_config() {
        let config = SessionConfig::from_toml_str(
            r#"
            cookie_name = "sid"
            cookie_domain = "example.com"
            idle_timeout_secs = 0
            storage = "cookie"
            transcoder = "json"

            [cookie_store]
            name = "sdata"
            hmac_key = "mac-key"
            secret_key = "enc-key"
            encryptor = "aes128_gcm"
            checksum = "hmac_sha512"
            max_age_secs = 600
            path = "/app"
            max_cookie_bytes = 2048
            "#,
        )
        .expect("parses");

        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.storage, StorageKind::Cookie);
        assert_eq!(config.transcoder, Some(TranscoderKind::Json));
        assert_eq!(config.cookie_store.encryptor, EncryptorKind::Aes128Gcm);
        assert_eq!(config.cookie_store.checksum, ChecksumAlgorithm::HmacSha512);
        assert_eq!(config.cookie_store.max_age_secs, Some(600));
        assert!(config.validate().is_ok());
        assert!(config.build_storage().is_ok());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = SessionConfig::from_toml_str(
            r#"
            [cookie_store]
            hmac_key = "very-secret-mac"
            "#,
        )
        .expect("parses");

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("very-secret-mac"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SessionConfig::from_toml_str("cookie_nmae = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn cookie_storage_requires_hmac_key() {
        let config = SessionConfig::from_toml_str("storage = \"cookie\"").expect("parses");
        assert!(matches!(config.validate(), Err(ConfigError::MissingSecret("hmac_key"))));

        let blank = SessionConfig::from_toml_str(
            "storage = \"cookie\"\n[cookie_store]\nhmac_key = \"  \"\n",
        )
        .expect("parses");
        assert!(matches!(blank.build_storage(), Err(ConfigError::MissingSecret("hmac_key"))));
    }

    #[test]
    fn blank_secret_key_fails_fast() {
        let config = SessionConfig::from_toml_str(
            "storage = \"cookie\"\n[cookie_store]\nhmac_key = \"mac\"\nsecret_key = \"\"\n",
        )
        .expect("parses");
        assert!(matches!(config.build_storage(), Err(ConfigError::MissingSecret("secret_key"))));
    }

    #[test]
    fn rejects_bad_cookie_settings() {
        let bad_name = SessionConfig::from_toml_str("cookie_name = \"a b\"").expect("parses");
        assert!(matches!(bad_name.validate(), Err(ConfigError::Invalid(_))));

        let bad_path = SessionConfig::from_toml_str("cookie_path = \"app\"").expect("parses");
        assert!(matches!(bad_path.validate(), Err(ConfigError::Invalid(_))));

        let clash = SessionConfig::from_toml_str(
            "storage = \"cookie\"\n[cookie_store]\nname = \"SESSIONID\"\nhmac_key = \"k\"\n",
        )
        .expect("parses");
        assert!(matches!(clash.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn strategy_uses_cookie_settings() {
        let config = SessionConfig::from_toml_str("cookie_name = \"sid\"\ncookie_path = \"/\"")
            .expect("parses");
        assert_eq!(config.build_strategy().cookie_name(), "sid");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "storage = \"key_value\"\nidle_timeout_secs = 60").expect("writes");

        let config = SessionConfig::from_toml_file(file.path()).expect("loads");
        assert_eq!(config.storage, StorageKind::KeyValue);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(60)));
        assert!(config.build_storage().is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = SessionConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
