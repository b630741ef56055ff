//! Enforcement pack: custom lints for session-core.
//!
//! Session ids and cookie payloads are bearer credentials. Everything the
//! library reports goes through `SessionLog`, which emits `tracing` events
//! tagged with the request id and only ever prints id fingerprints.
//!
//! ## Implemented Lints
//!
//! - `NO_PRINTLN`: Forbids the stdout/stderr macros so session ids and
//!   cookie values cannot reach the terminal unredacted.

#![feature(rustc_private)]
#![warn(unused_extern_crates)]

extern crate rustc_ast;
extern crate rustc_lint;
extern crate rustc_session;
extern crate rustc_span;

use rustc_ast::{Expr, ExprKind, MacCall};
use rustc_lint::{EarlyContext, EarlyLintPass, LintContext};
use rustc_session::{declare_lint_pass, declare_tool_lint};

declare_tool_lint! {
    /// **What it does:** Forbids `print!`, `println!`, `eprint!`, `eprintln!`
    /// and `dbg!` in library code.
    ///
    /// **Why is this bad?** Output written this way:
    /// - skips the request id that `SessionLog` attaches to every event
    /// - is not filtered by the subscriber's level
    /// - tends to carry whole session ids or cookie payloads, which let
    ///   anyone reading the output hijack the session
    ///
    /// **Known problems:** None.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Bad - prints a live credential
    /// println!("resumed session {}", data.id());
    /// dbg!(&cookie);
    ///
    /// // Good - request-scoped and fingerprinted
    /// use session_core::{fingerprint, SessionLog};
    /// SessionLog::new(request.request_id())
    ///     .debug(format_args!("resumed session {}", fingerprint(data.id())));
    /// ```
    pub enforcement_pack::NO_PRINTLN,
    Deny,
    "use of print!, println!, eprint!, eprintln!, or dbg!; use SessionLog instead"
}

declare_lint_pass!(NoPrintln => [NO_PRINTLN]);

impl EarlyLintPass for NoPrintln {
    fn check_expr(&mut self, cx: &EarlyContext<'_>, expr: &Expr) {
        if let ExprKind::MacCall(mac) = &expr.kind {
            check_macro(cx, mac, expr.span);
        }
    }
}

/// Suggested replacement for each forbidden macro.
fn replacement(macro_name: &str) -> Option<&'static str> {
    match macro_name {
        "print" | "println" => Some("SessionLog::info"),
        "eprint" | "eprintln" => Some("SessionLog::error"),
        "dbg" => Some("SessionLog::debug"),
        _ => None,
    }
}

fn check_macro(cx: &EarlyContext<'_>, mac: &MacCall, span: rustc_span::Span) {
    let path = &mac.path;

    // Qualified paths such as `std::println!` are rare enough to ignore.
    if path.segments.len() != 1 {
        return;
    }

    let macro_name = path.segments[0].ident.name.as_str();
    let Some(suggestion) = replacement(macro_name) else {
        return;
    };

    cx.span_lint(NO_PRINTLN, span, |diag| {
        diag.help(format!("use `{suggestion}` with `fingerprint(id)` for session ids"));
        diag.note(format!("`{macro_name}!` bypasses the tracing subscriber and may print live session ids"));
    });
}

#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn register_lints(_sess: &rustc_session::Session, lint_store: &mut rustc_lint::LintStore) {
    lint_store.register_lints(&[&NO_PRINTLN]);
    lint_store.register_early_pass(|| Box::new(NoPrintln));
}

#[unsafe(no_mangle)]
pub fn dylint_version() -> *mut std::os::raw::c_char {
    std::ffi::CString::new(dylint_linting::DYLINT_VERSION)
        .expect("version string contains null byte")
        .into_raw()
}
