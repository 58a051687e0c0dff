//! Integration Test: Decoder Purity
//!
//! Aircraft decoders are pure functions from a snapshot to a cell grid. They
//! must not touch the runtime or the network, and must not panic on input
//! they do not understand.
//!
//! **Allowed**: `grid`, `snapshot`, `station`, `serde_json`, `tracing`
//! **Forbidden**: `tokio`, `reqwest`, `tungstenite`, `.await`, `unwrap()`

use cdu_bridge_architecture::{find_violations, workspace_root, Rule};

const RULES: &[Rule] = &[
    Rule::new("tokio", "Runtime dependency in decoder"),
    Rule::new("reqwest", "HTTP client in decoder"),
    Rule::new("tungstenite", "WebSocket in decoder"),
    Rule::new(".await", "Async call in decoder"),
    Rule::new("sleep(", "Sleep in decoder"),
    Rule::new("unwrap()", "Panicking unwrap in decoder"),
    Rule::new("expect(", "Panicking expect in decoder"),
];

#[test]
fn test_aircraft_decoders_are_pure() {
    let dir = workspace_root().join("bridge/core/src/aircraft");
    assert!(dir.exists(), "missing {}", dir.display());

    let violations = find_violations(&dir, RULES);
    if !violations.is_empty() {
        eprintln!("\nDecoders must stay free of I/O and panics:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!("\nFound {} decoder purity violation(s)", violations.len());
    }
}

#[test]
fn test_grid_and_snapshot_are_pure() {
    let root = workspace_root().join("bridge/core/src");
    let mut violations = Vec::new();
    for file in ["grid.rs", "snapshot.rs", "station.rs"] {
        let path = root.join(file);
        let content = std::fs::read_to_string(&path).unwrap();
        for (line, code) in cdu_bridge_architecture::production_lines(&content) {
            if RULES.iter().any(|r| code.contains(r.pattern)) {
                violations.push(format!("{}:{line} - {}", path.display(), code.trim()));
            }
        }
    }
    assert!(violations.is_empty(), "{violations:#?}");
}
