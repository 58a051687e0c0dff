//! Integration Test: Blocking I/O Prohibition
//!
//! The relay loops and transport layer run on the tokio runtime. A blocking
//! call there stalls every station pipeline sharing the worker thread.
//!
//! **Required**: `tokio::net`, `tokio::time::sleep`, async `reqwest`
//! **Forbidden**: `std::net`, `std::fs`, `std::thread::sleep`, `reqwest::blocking`
//!
//! Configuration loading reads its file with `std::fs` before the pipelines
//! start, so `config/` is not scanned.

use cdu_bridge_architecture::{find_violations, workspace_root, Rule};

const RULES: &[Rule] = &[
    Rule::new("std::fs", "Blocking file I/O"),
    Rule::new("std::net", "Blocking network I/O"),
    Rule::new("thread::sleep", "Blocking sleep"),
    Rule::new("reqwest::blocking", "Blocking HTTP client"),
    Rule::new("block_on(", "Nested runtime"),
];

fn check(relative: &str) -> Vec<String> {
    let dir = workspace_root().join(relative);
    assert!(dir.exists(), "missing {}", dir.display());
    find_violations(&dir, RULES)
}

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = check("bridge/core/src/relay");
    violations.extend(check("bridge/core/src/transport"));

    if !violations.is_empty() {
        eprintln!("\nBlocking calls found in async code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nUse tokio::net, tokio::time::sleep and async reqwest instead.");
        panic!("\nFound {} blocking I/O violation(s)", violations.len());
    }
}
