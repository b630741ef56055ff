use session_core::{
    ConfigError, CookieSessionDataStorage, CookieSessionStrategy, EncryptedSessionDataTranscoder,
    KeyValueSessionDataStorage, MapSessionDataTranscoder, MemoryKeyValueStore,
    MemorySessionDataStorage, Resolution, Secret, SessionConfig, SessionData, SessionDataStorage,
    SessionDataTranscoder, SessionManager, SignedSessionDataTranscoder, Tainted,
};
use session_core::web::{SessionRequest, SessionResponse};
use std::time::Duration;

#[test]
fn secret_is_fully_redacted() {
    let hmac_key = Secret::new("hmac-secret123".to_string());

    let debug_out = format!("{:?}", hmac_key);
    assert_eq!(debug_out, "[REDACTED]");
    assert!(!debug_out.contains("hmac-secret"));
    assert!(!debug_out.contains("String")); // No type info leaked

    let display_out = format!("{}", hmac_key);
    assert_eq!(display_out, "[REDACTED]");
}

#[test]
fn tainted_prevents_misuse() {
    let requested_id = Tainted::new("abc; Path=/admin".to_string());

    // Can create and debug
    let debug_out = format!("{:?}", requested_id);
    assert!(debug_out.contains("Tainted"));

    // But cannot use as String (no implicit conversions)
    // Uncommenting this would fail to compile:
    // let _s: String = requested_id;
}

#[test]
fn session_data_equality_is_by_id() {
    let mut a = SessionData::new();
    let mut b = a.clone();
    a.put("k", "1");
    b.put("k", "2");

    assert_eq!(a, b);
    assert_ne!(a, SessionData::new());
}

#[test]
fn every_storage_honours_the_contract() {
    let storages: Vec<(&str, Box<dyn SessionDataStorage>)> = vec![
        ("memory", Box::new(MemorySessionDataStorage::new())),
        (
            "key_value",
            Box::new(KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())),
        ),
        (
            "cookie",
            Box::new(CookieSessionDataStorage::signed(Secret::new("k".to_string()))),
        ),
    ];

    for (name, storage) in storages {
        let mut data = storage.create();
        assert!(data.is_empty(), "{name}: created session has attributes");
        data.put("user", "alice");

        let mut response = SessionResponse::new();
        storage
            .save(&SessionRequest::new("req-save"), &mut response, &data)
            .expect("saves");

        // Cookie storage needs its cookie back; server-side stores ignore it.
        let mut request = SessionRequest::new("req-get");
        for cookie in response.cookies() {
            request.add_cookie(cookie.name(), cookie.value());
        }

        let loaded = storage
            .get(&request, data.id())
            .expect("no backend error")
            .unwrap_or_else(|| panic!("{name}: saved session not found"));
        assert_eq!(loaded.get("user"), Some("alice"), "{name}");

        storage
            .delete(&request, &mut SessionResponse::new(), data.id())
            .expect("deletes");
    }
}

#[test]
fn server_side_sessions_expire_without_delete() {
    let memory = MemorySessionDataStorage::with_idle_timeout(Some(Duration::ZERO));
    let kv = KeyValueSessionDataStorage::new(MemoryKeyValueStore::new())
        .with_idle_timeout(Some(Duration::ZERO));
    let request = SessionRequest::new("req-expiry");

    for storage in [&memory as &dyn SessionDataStorage, &kv] {
        let data = storage.create();
        storage
            .save(&request, &mut SessionResponse::new(), &data)
            .expect("saves");
        assert!(storage.get(&request, data.id()).expect("no backend error").is_none());
    }
}

#[test]
fn encrypted_transcoder_requires_secret() {
    let result = EncryptedSessionDataTranscoder::builder()
        .transcoder(Box::new(MapSessionDataTranscoder))
        .build();
    assert!(matches!(result, Err(ConfigError::MissingSecret(_))));
}

#[test]
fn encrypted_cookie_never_shows_attributes() {
    let transcoder = EncryptedSessionDataTranscoder::builder()
        .secret_key(Secret::new("enc-key".to_string()))
        .hmac_key(Secret::new("mac-key".to_string()))
        .build()
        .expect("builds");

    let mut data = SessionData::new();
    data.put("email", "alice@example.com");

    let payload = transcoder.encode(&data).expect("encodes");
    assert!(!payload.contains("alice"));
    assert!(!payload.contains(data.id()));
}

#[test]
fn manager_from_config_fails_fast_without_key() {
    let config = SessionConfig::from_toml_str("storage = \"cookie\"").expect("parses");
    let err = SessionManager::from_config(config).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSecret("hmac_key")));
}

#[test]
fn manager_from_config_runs_cookie_sessions() {
    let config = SessionConfig::from_toml_str(
        r#"
        storage = "cookie"

        [cookie_store]
        hmac_key = "integration-mac"
        secret_key = "integration-enc"
        "#,
    )
    .expect("parses");
    let manager = SessionManager::from_config(config).expect("builds");

    let mut response = SessionResponse::new();
    manager
        .handle(&SessionRequest::new("req-1"), &mut response, |scope| {
            scope.session().put("cart", "3 items");
            Ok(())
        })
        .expect("handles");

    assert!(response.cookie("SESSIONID").is_some());
    let payload = response.cookie("SESSION_DATA").expect("payload cookie");
    assert!(!payload.value().contains("3 items"));

    let mut next = SessionRequest::new("req-2");
    for cookie in response.cookies() {
        next.add_cookie(cookie.name(), cookie.value());
    }
    let cart = manager
        .handle(&next, &mut SessionResponse::new(), |scope| {
            Ok(scope.existing_session().and_then(|s| s.get("cart").map(str::to_string)))
        })
        .expect("handles");
    assert_eq!(cart.as_deref(), Some("3 items"));
}

#[test]
fn configured_idle_timeout_refuses_old_signed_payload() {
    let config = SessionConfig::from_toml_str(
        r#"
        idle_timeout_secs = 1
        storage = "cookie"

        [cookie_store]
        hmac_key = "integration-mac"
        "#,
    )
    .expect("parses");
    let manager = SessionManager::from_config(config).expect("builds");

    // Correctly signed, but created and last used at the epoch.
    let id = "0123456789abcdef0123456789abcdef";
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert("user".to_string(), "alice".to_string());
    let payload = SignedSessionDataTranscoder::new(
        MapSessionDataTranscoder,
        Secret::new("integration-mac".to_string()),
    )
    .encode(&SessionData::restore(id, 1, attributes))
    .expect("encodes");

    let mut request = SessionRequest::new("req-old");
    request.add_cookie("SESSIONID", id);
    request.add_cookie("SESSION_DATA", payload);

    let mut scope = manager.scope(&request);
    assert!(scope.existing_session().is_none());
    assert_eq!(scope.resolution(), Resolution::ExistingInvalid);

    let mut response = SessionResponse::new();
    scope.commit(&mut response).expect("commits");
    assert_eq!(response.cookie("SESSIONID").map(|c| c.value()), Some(""));
    assert_eq!(response.cookie("SESSION_DATA").map(|c| c.value()), Some(""));
}

#[test]
fn strategy_and_manager_share_across_threads() {
    let manager = std::sync::Arc::new(SessionManager::new(
        MemorySessionDataStorage::new(),
        CookieSessionStrategy::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let manager = std::sync::Arc::clone(&manager);
            std::thread::spawn(move || {
                let request = SessionRequest::new(format!("req-thread-{i}"));
                let mut response = SessionResponse::new();
                manager
                    .handle(&request, &mut response, |scope| {
                        Ok(scope.session().id().to_string())
                    })
                    .expect("handles")
            })
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().expect("thread finished"))
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
