//! Layering Rules
//!
//! The session core must build and test without a terminal, and the tick
//! path must never wait on anything.

use architectural_enforcement::{find_violations, rust_files};

/// Modules a tick runs through
const TICK_PATH: &[&str] = &[
    "conductor/core/src/coordinator.rs",
    "conductor/core/src/state.rs",
    "conductor/core/src/tasks.rs",
    "conductor/core/src/view.rs",
    "conductor/core/src/session.rs",
    "conductor/core/src/input",
    "conductor/core/src/animation",
];

const WAITING_CALLS: &[&str] = &[
    "thread::sleep",
    "block_on",
    ".recv()",
    "recv_timeout",
    "blocking_recv",
    ".join()",
    ".wait()",
];

fn report(what: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {what}:");
    for v in violations {
        eprintln!("  {v}");
    }
    panic!("{} violation(s) found", violations.len());
}

#[test]
fn test_core_has_no_terminal_crates() {
    let files = rust_files("conductor/core/src");
    assert!(!files.is_empty(), "core sources not found");

    let violations = find_violations(&files, &["ratatui", "crossterm"]);
    report("terminal crates used in the session core", &violations);
}

#[test]
fn test_tick_path_never_waits() {
    let files: Vec<_> = TICK_PATH.iter().flat_map(|dir| rust_files(dir)).collect();
    assert!(files.len() >= TICK_PATH.len(), "tick path sources not found");

    let violations = find_violations(&files, WAITING_CALLS);
    report("waiting calls on the tick path", &violations);
}

#[test]
fn test_front_end_never_calls_collaborators() {
    let files = rust_files("tui/src");
    assert!(!files.is_empty(), "tui sources not found");

    let violations = find_violations(&files, &[".generate(", ".speak("]);
    report("front-end code calling the model or speaker directly", &violations);
}
