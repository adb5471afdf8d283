//! Architectural Enforcement
//!
//! Source scanners shared by the enforcement tests in `tests/`. They check
//! layering rules that the compiler cannot: the session core stays free of
//! terminal crates, and nothing on the tick path waits.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("../.."))
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Production lines of a file with `//` comments stripped, numbered from 1.
/// Scanning stops at the first `#[cfg(test)]`; test modules sit at the end
/// of each file.
#[must_use]
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            (idx + 1, code.to_string())
        })
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// `path:line: code` for every production line containing one of `needles`
#[must_use]
pub fn find_violations(files: &[PathBuf], needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in files {
        for (line_no, code) in production_lines(file) {
            if needles.iter().any(|n| code.contains(n)) {
                violations.push(format!("{}:{line_no}: {}", file.display(), code.trim()));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_production_lines_skip_comments_and_tests() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fn a() {{}} // thread::sleep").unwrap();
        writeln!(file, "// block_on").unwrap();
        writeln!(file, "fn b() {{ std::thread::sleep(d); }}").unwrap();
        writeln!(file, "#[cfg(test)]").unwrap();
        writeln!(file, "fn c() {{ std::thread::sleep(d); }}").unwrap();

        let files = vec![file.path().to_path_buf()];
        let found = find_violations(&files, &["thread::sleep"]);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains(":3:"));
    }

    #[test]
    fn test_workspace_root_holds_both_crates() {
        let root = workspace_root();
        assert!(root.join("conductor/core/src/lib.rs").exists());
        assert!(root.join("tui/src/lib.rs").exists());
    }
}
