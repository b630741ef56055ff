//! Encrypted payload demonstration.
//!
//! This example shows what a client can and cannot learn from a session
//! payload cookie:
//! 1. Encode the same session with the signed and the encrypted transcoder
//! 2. Compare what each payload reveals
//! 3. Tamper with the encrypted payload and see it rejected
//! 4. Decode with the wrong key
//! 5. Run a request cycle over encrypted cookie storage
//!
//! Run with: `cargo run --example encrypted_payload`

use session_core::web::{SessionRequest, SessionResponse};
use session_core::{
    CookieSessionDataStorage, CookieSessionStrategy, EncryptedSessionDataTranscoder,
    EncryptorKind, MapSessionDataTranscoder, Secret, SessionData, SessionDataTranscoder,
    SessionManager, SignedSessionDataTranscoder,
};

fn encrypted(secret: &str, hmac: &str) -> Result<EncryptedSessionDataTranscoder, Box<dyn std::error::Error>> {
    Ok(EncryptedSessionDataTranscoder::builder()
        .secret_key(Secret::new(secret.to_string()))
        .hmac_key(Secret::new(hmac.to_string()))
        .encryptor_kind(EncryptorKind::Aes256Gcm)
        .transcoder(Box::new(MapSessionDataTranscoder))
        .build()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Encrypted Payload Example ===\n");

    let mut data = SessionData::new();
    data.put("user", "alice");
    data.put("role", "auditor");

    // Step 1: signed vs encrypted
    println!("--- Scenario 1: What the browser sees ---");
    let signed = SignedSessionDataTranscoder::new(
        MapSessionDataTranscoder,
        Secret::new("demo-hmac".to_string()),
    );
    let transcoder = encrypted("demo-secret", "demo-hmac")?;
    println!("Transcoder: {transcoder:?}");

    let signed_payload = signed.encode(&data)?;
    let encrypted_payload = transcoder.encode(&data)?;
    println!("1. Signed payload:    {} chars", signed_payload.len());
    println!("   Encrypted payload: {} chars", encrypted_payload.len());

    // Step 2: readability
    let decoded_signed = base64_text(&signed_payload);
    println!(
        "2. Signed payload reveals \"alice\":    {}",
        decoded_signed.contains("alice")
    );
    println!(
        "   Encrypted payload reveals \"alice\": {}",
        base64_text(&encrypted_payload).contains("alice")
    );
    let restored = transcoder.decode(&encrypted_payload)?;
    println!("   ✓ Server decodes user = {:?}", restored.get("user"));

    // Step 3: tampering
    println!("\n--- Scenario 2: Tampered ciphertext ---");
    let mut chars: Vec<char> = encrypted_payload.chars().collect();
    let middle = chars.len() / 2;
    chars[middle] = if chars[middle] == 'A' { 'B' } else { 'A' };
    let forged: String = chars.into_iter().collect();
    match transcoder.decode(&forged) {
        Ok(_) => println!("   ✗ Tampered payload accepted"),
        Err(e) => println!("3. ✓ Tampered payload rejected: {e}"),
    }

    // Step 4: wrong key
    println!("\n--- Scenario 3: Another deployment's key ---");
    let other = encrypted("other-secret", "demo-hmac")?;
    match other.decode(&encrypted_payload) {
        Ok(_) => println!("   ✗ Foreign key decoded the payload"),
        Err(e) => println!("4. ✓ Foreign key rejected: {e}"),
    }

    // Step 5: request cycle
    println!("\n--- Scenario 4: Encrypted cookie storage ---");
    let manager = SessionManager::new(
        CookieSessionDataStorage::new(encrypted("demo-secret", "demo-hmac")?),
        CookieSessionStrategy::default(),
    );
    let mut response = SessionResponse::new();
    manager.handle(&SessionRequest::new("req-1"), &mut response, |scope| {
        scope.session().put("cart", "3 items");
        Ok(())
    })?;
    for cookie in response.cookies() {
        println!("5. Set-Cookie {} ({} chars)", cookie.name(), cookie.value().len());
    }

    let mut request = SessionRequest::new("req-2");
    for cookie in response.cookies() {
        request.add_cookie(cookie.name(), cookie.value());
    }
    let cart = manager.handle(&request, &mut SessionResponse::new(), |scope| {
        Ok(scope.existing_session().and_then(|s| s.get("cart").map(str::to_string)))
    })?;
    println!("   ✓ Next request reads cart = {cart:?}");

    println!("\n=== Summary ===");
    println!("✓ Signed payloads are tamper-evident but readable");
    println!("✓ Encrypted payloads hide attribute values from the client");
    println!("✓ Any altered byte or foreign key yields no session");

    Ok(())
}

/// Best-effort view of a payload as the client could decode it.
fn base64_text(payload: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
