//! Integration property tests for session-core.
//!
//! These tests validate cross-module invariants and end-to-end flows
//! using property-based testing.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use proptest::prelude::*;
use session_core::web::{SessionRequest, SessionResponse};
use session_core::{
    CookieSessionStrategy, EncryptedSessionDataTranscoder, JsonSessionDataTranscoder,
    MapSessionDataTranscoder, MemorySessionDataStorage, Sanitizer, Secret, SessionData,
    SessionDataTranscoder, SessionIdSanitizer, SessionManager, SignedSessionDataTranscoder, Tainted,
};

// Strategy: attribute maps without reserved keys
fn arb_attributes() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z][a-z0-9_]{0,12}").unwrap(),
        prop::string::string_regex("[ -~]{0,40}").unwrap(),
        0..6,
    )
}

// Strategy: arbitrary session data
fn arb_session() -> impl Strategy<Value = SessionData> {
    (
        prop::string::string_regex("[0-9a-f]{32}").unwrap(),
        0i64..4_102_444_800_000,
        arb_attributes(),
    )
        .prop_map(|(id, created, attributes)| SessionData::restore(id, created, attributes))
}

fn signed() -> SignedSessionDataTranscoder<MapSessionDataTranscoder> {
    SignedSessionDataTranscoder::new(MapSessionDataTranscoder, Secret::new("prop-mac".to_string()))
}

fn encrypted() -> EncryptedSessionDataTranscoder {
    EncryptedSessionDataTranscoder::builder()
        .secret_key(Secret::new("prop-enc".to_string()))
        .hmac_key(Secret::new("prop-mac".to_string()))
        .transcoder(Box::new(MapSessionDataTranscoder))
        .build()
        .expect("valid keys")
}

proptest! {
    /// Property: decode(encode(s)) keeps id, creation time and attributes for every transcoder
    #[test]
    fn proptest_round_trip_all_transcoders(data in arb_session()) {
        let transcoders: Vec<Box<dyn SessionDataTranscoder>> = vec![
            Box::new(JsonSessionDataTranscoder),
            Box::new(MapSessionDataTranscoder),
            Box::new(signed()),
            Box::new(encrypted()),
        ];

        for transcoder in transcoders {
            let decoded = transcoder
                .decode(&transcoder.encode(&data).expect("valid data encodes"))
                .expect("own output decodes");
            prop_assert_eq!(decoded.id(), data.id());
            prop_assert_eq!(decoded.creation_time(), data.creation_time());
            prop_assert_eq!(decoded.attributes(), data.attributes());
        }
    }

    /// Property: flipping any byte of an encrypted payload never yields a session
    #[test]
    fn proptest_encrypted_tamper_rejected(
        data in arb_session(),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let transcoder = encrypted();
        let payload = transcoder.encode(&data).expect("encodes");

        let mut raw = URL_SAFE_NO_PAD.decode(&payload).expect("payload is base64url");
        let i = position.index(raw.len());
        raw[i] ^= flip;
        let forged = URL_SAFE_NO_PAD.encode(&raw);

        prop_assert!(transcoder.decode(&forged).is_err());
    }

    /// Property: changing any character of a signed payload never yields altered data
    #[test]
    fn proptest_signed_tamper_rejected(
        data in arb_session(),
        position in any::<prop::sample::Index>(),
        replacement in prop::sample::select(vec!['A', 'z', '0', '-', '_']),
    ) {
        let transcoder = signed();
        let payload = transcoder.encode(&data).expect("encodes");

        let mut chars: Vec<char> = payload.chars().collect();
        let i = position.index(chars.len());
        prop_assume!(chars[i] != replacement);
        chars[i] = replacement;
        let forged: String = chars.into_iter().collect();

        // Either rejected outright, or decodes to exactly the original (base64
        // padding bits can absorb a change in the last character).
        if let Ok(decoded) = transcoder.decode(&forged) {
            prop_assert_eq!(decoded.id(), data.id());
            prop_assert_eq!(decoded.attributes(), data.attributes());
        }
    }

    /// Property: within one request, repeated access returns the same session and is_new is stable
    #[test]
    fn proptest_idempotent_resolution(calls in 1usize..8, with_existing in any::<bool>()) {
        let manager = SessionManager::new(MemorySessionDataStorage::new(), CookieSessionStrategy::default());

        let request = if with_existing {
            let mut response = SessionResponse::new();
            manager
                .handle(&SessionRequest::new("req-seed"), &mut response, |scope| {
                    scope.session();
                    Ok(())
                })
                .expect("seeds");
            let id = response.cookie("SESSIONID").expect("cookie").value().to_string();
            SessionRequest::from_cookie_header("req-prop", &format!("SESSIONID={id}"))
        } else {
            SessionRequest::new("req-prop")
        };

        let mut scope = manager.scope(&request);
        let first_id = scope.session().id().to_string();
        let first_new = scope.session().is_new();
        prop_assert_eq!(first_new, !with_existing);

        for _ in 0..calls {
            let session = scope.session();
            prop_assert_eq!(session.id(), first_id.as_str());
            prop_assert_eq!(session.is_new(), first_new);
        }
    }

    /// Property: a fresh session produces exactly one id cookie carrying an unseen id
    #[test]
    fn proptest_new_session_single_cookie(requests in 1usize..6) {
        let manager = SessionManager::new(MemorySessionDataStorage::new(), CookieSessionStrategy::default());
        let mut seen = std::collections::HashSet::new();

        for i in 0..requests {
            let mut response = SessionResponse::new();
            manager
                .handle(&SessionRequest::new(format!("req-{i}")), &mut response, |scope| {
                    scope.session();
                    scope.session();
                    Ok(())
                })
                .expect("handles");

            prop_assert_eq!(response.cookies().len(), 1);
            let id = response.cookie("SESSIONID").expect("cookie").value().to_string();
            prop_assert!(seen.insert(id), "session id reused");
        }
    }

    /// Property: the id sanitizer rejects anything outside [A-Za-z0-9_-]
    #[test]
    fn proptest_sanitizer_rejects_cookie_syntax(
        prefix in prop::string::string_regex("[a-z0-9]{0,8}").unwrap(),
        bad in prop::sample::select(vec![';', '=', ' ', ',', '"', '/', '\\', '\u{0}', 'é']),
        suffix in prop::string::string_regex("[a-z0-9]{0,8}").unwrap(),
    ) {
        let candidate = format!("{prefix}{bad}{suffix}");
        let result = SessionIdSanitizer::default().sanitize(Tainted::new(candidate));
        prop_assert!(result.is_err());
    }
}
