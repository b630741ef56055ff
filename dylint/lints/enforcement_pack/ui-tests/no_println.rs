// Test case for NO_PRINTLN lint

fn bad_println(session_id: &str) {
    println!("created session {session_id}");
}

fn bad_print(session_id: &str) {
    print!("{session_id}");
}

fn bad_eprintln(cookie: &str) {
    eprintln!("rejected cookie {cookie}");
}

fn bad_dbg() {
    let id = "0123456789abcdef";
    dbg!(id);
}

// Good: using tracing
fn good_tracing() {
    tracing::debug!(request_id = "req-1", "session resumed");
}

fn main() {
    bad_println("0123456789abcdef");
    bad_print("0123456789abcdef");
    bad_eprintln("SESSIONID=abc");
    bad_dbg();
    good_tracing();
}
