//! Regular-expression deletion over the repository's file listing.

use crate::gate::{ExecutionGate, Reason};
use crate::storage::{files_under, Storage};
use regex::{Regex, RegexBuilder};
use std::path::Path;

/// Compile a user-supplied expression for case-insensitive path matching.
pub fn compile(expr: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(expr).case_insensitive(true).build()
}

/// Flag every file under `root` whose absolute path matches `pattern`.
///
/// Only files are tested, never directories. Callers skip this pass
/// entirely when no expression was supplied; the skip avoids the full
/// repository walk rather than walking and matching nothing.
pub fn apply(storage: &dyn Storage, root: &Path, pattern: &Regex, gate: &mut ExecutionGate) {
    for file in files_under(storage, root) {
        if pattern.is_match(&file.path.to_string_lossy()) {
            gate.submit(&file.path, Reason::PatternMatch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::ExecutionMode;
    use crate::storage::LocalFs;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn matching_is_case_insensitive() {
        let pattern = compile(".*plugin-example.*").unwrap();
        assert!(pattern.is_match("/repo/org/PLUGIN-EXAMPLE/1.0/x.jar"));
    }

    #[test]
    fn invalid_expression_is_a_compile_error() {
        assert!(compile("[unclosed").is_err());
    }

    #[test]
    fn only_files_are_flagged() {
        let dir = tempdir().unwrap();
        // Both the directory and the file path contain the matched text.
        let sub = dir.path().join("plugin-example");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("plugin-example-1.0.jar"), "jar").unwrap();

        let pattern = compile(".*plugin-example.*").unwrap();
        let mut gate = ExecutionGate::new(ExecutionMode::List, false, &LocalFs);
        apply(&LocalFs, dir.path(), &pattern, &mut gate);
        let (report, _) = gate.finish();

        assert_eq!(report.candidates.len(), 1);
        assert_eq!(
            report.candidates[0].path,
            sub.join("plugin-example-1.0.jar")
        );
    }
}
