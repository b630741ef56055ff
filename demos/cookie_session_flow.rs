//! Cookie session flow demonstration.
//!
//! This example shows a login/profile/logout sequence where the whole
//! session lives in the browser:
//! 1. Build a manager from TOML configuration
//! 2. Log in and receive the id cookie plus a signed payload cookie
//! 3. Replay the cookies to read and update the session
//! 4. Present a tampered payload and watch both cookies get cleared
//! 5. Log out
//!
//! Run with: `cargo run --example cookie_session_flow`

use session_core::web::example_handler::{handle_login, handle_logout, handle_profile};
use session_core::web::{SessionRequest, SessionResponse};
use session_core::{fingerprint, SessionConfig, SessionManager};

const CONFIG: &str = r#"
idle_timeout_secs = 1800
storage = "cookie"

[cookie_store]
hmac_key = "demo-signing-key"
max_age_secs = 86400
"#;

/// Replays the cookies a response set, the way a browser would.
fn browser_follow_up(request_id: &str, response: &SessionResponse) -> SessionRequest {
    let mut request = SessionRequest::new(request_id);
    for cookie in response.cookies() {
        if !cookie.value().is_empty() {
            request.add_cookie(cookie.name(), cookie.value());
        }
    }
    request
}

fn print_cookies(response: &SessionResponse) {
    if response.is_empty() {
        println!("   (no Set-Cookie headers)");
    }
    for header in response.set_cookie_headers() {
        let (name, rest) = header.split_once('=').unwrap_or((header.as_str(), ""));
        let value = rest.split(';').next().unwrap_or_default();
        let shown = if value.is_empty() {
            "<cleared>".to_string()
        } else {
            format!("{} ({} chars)", fingerprint(value), value.len())
        };
        println!("   Set-Cookie: {name}={shown}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Cookie Session Flow Example ===\n");

    // Step 1: configuration
    let config = SessionConfig::from_toml_str(CONFIG)?;
    let manager = SessionManager::from_config(config)?;
    println!("1. ✓ Manager built from configuration");

    // Step 2: login
    println!("\n--- Scenario 1: Login ---");
    let mut login = SessionResponse::new();
    let result = manager.handle(&SessionRequest::new("req-login"), &mut login, |scope| {
        handle_login(scope, "alice")
    })?;
    println!("2. ✓ Logged in as {}", result.user);
    print_cookies(&login);

    // Step 3: profile views
    println!("\n--- Scenario 2: Returning visitor ---");
    let mut browser = login;
    for n in 1..=2 {
        let request = browser_follow_up(&format!("req-profile-{n}"), &browser);
        let mut response = SessionResponse::new();
        let profile = manager.handle(&request, &mut response, handle_profile)?;
        println!("3. ✓ Profile of {} viewed {} time(s)", profile.user, profile.views);
        print_cookies(&response);

        // Only the payload cookie is rewritten; keep the id cookie we had.
        for cookie in response.cookies() {
            browser.set_cookie(cookie.clone());
        }
    }

    // Step 4: tampered payload
    println!("\n--- Scenario 3: Tampered payload ---");
    let mut request = SessionRequest::new("req-tampered");
    if let Some(id) = browser.cookie("SESSIONID") {
        request.add_cookie("SESSIONID", id.value());
    }
    request.add_cookie("SESSION_DATA", "eyJ1c2VyIjoiYWRtaW4ifQ");
    let mut response = SessionResponse::new();
    match manager.handle(&request, &mut response, handle_profile) {
        Ok(profile) => println!("   ✗ Unexpectedly accepted as {}", profile.user),
        Err(e) => println!("4. ✓ Rejected: {e}"),
    }
    print_cookies(&response);

    // Step 5: logout
    println!("\n--- Scenario 4: Logout ---");
    let request = browser_follow_up("req-logout", &browser);
    let mut response = SessionResponse::new();
    let logged_out = manager.handle(&request, &mut response, handle_logout)?;
    println!("5. ✓ Logged out: {logged_out}");
    print_cookies(&response);

    println!("\n=== Summary ===");
    println!("✓ Session state travelled in a signed cookie");
    println!("✓ A payload that fails verification is never trusted");
    println!("✓ Logout clears both cookies");

    Ok(())
}
