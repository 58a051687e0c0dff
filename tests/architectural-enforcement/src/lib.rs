//! Architectural Enforcement Helpers
//!
//! Source scanners shared by the integration tests in `tests/`:
//! - Aircraft decoders stay pure (no runtime, no network, no panics)
//! - Relay and transport code never blocks the runtime
//!
//! Scanning is line based. Comments are dropped and everything from the
//! first `#[cfg(test)]` onward is treated as test code.

use std::fs;
use std::path::{Path, PathBuf};

/// A forbidden source pattern and the reason it is forbidden
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Substring that must not appear in production code
    pub pattern: &'static str,
    /// Short explanation printed with each violation
    pub reason: &'static str,
}

impl Rule {
    /// Create a rule
    #[must_use]
    pub const fn new(pattern: &'static str, reason: &'static str) -> Self {
        Self { pattern, reason }
    }
}

/// Root of the workspace, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under `dir`, sorted
#[must_use]
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Production code lines with their 1-based line numbers
///
/// Comments are stripped and scanning stops at the first `#[cfg(test)]`.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        let code = line.split("//").next().unwrap_or(line).trim_end();
        if !code.trim().is_empty() {
            lines.push((idx + 1, code));
        }
    }
    lines
}

/// Check every Rust file under `dir` against `rules`
///
/// Returns one human-readable line per violation.
#[must_use]
pub fn find_violations(dir: &Path, rules: &[Rule]) -> Vec<String> {
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line_number, code) in production_lines(&content) {
            for rule in rules.iter().filter(|r| code.contains(r.pattern)) {
                violations.push(format!(
                    "{}:{} - {}: {}",
                    path.display(),
                    line_number,
                    rule.reason,
                    code.trim()
                ));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_skip_comments_and_tests() {
        let source = "use std::fmt;\n// tokio here\nlet x = 1; // .await\n\n#[cfg(test)]\nmod tests { tokio }\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "use std::fmt;"), (3, "let x = 1;")]);
    }

    #[test]
    fn test_workspace_root_holds_core_crate() {
        assert!(workspace_root().join("bridge").join("core").join("Cargo.toml").exists());
    }
}
