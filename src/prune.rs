//! Empty-directory reclamation, run after every other deletion pass.

use crate::gate::{ExecutionGate, Reason};
use crate::storage::{dirs_under, Storage};
use std::path::Path;

/// Flag every directory under `root` holding zero immediate files,
/// deepest first.
///
/// Emptiness is defined purely on the immediate file count: remaining
/// sub-directories do not block the test. The gate removes such a directory
/// non-recursively, so one whose subtree still holds files simply fails
/// best-effort and stays.
///
/// Deepest-first order is a correctness requirement, not an optimization:
/// an empty leaf must be removed before its parent is attempted, otherwise
/// the parent removal fails while the leaf was deletable all along.
pub fn apply(storage: &dyn Storage, root: &Path, gate: &mut ExecutionGate) {
    let mut dirs = dirs_under(storage, root);
    dirs.sort_by(|a, b| {
        let depth_a = a.path.components().count();
        let depth_b = b.path.components().count();
        depth_b.cmp(&depth_a).then_with(|| a.path.cmp(&b.path))
    });

    for dir in dirs {
        // A directory deleted earlier in this very pass, or by a previous
        // pass, is no longer a candidate.
        if !storage.exists(&dir.path) {
            continue;
        }

        let has_files = match storage.list_children(&dir.path) {
            Ok(children) => children.iter().any(|child| !child.is_dir),
            Err(err) => {
                eprintln!(
                    "Warning: failed to read directory {}: {}",
                    dir.path.display(),
                    err
                );
                continue;
            }
        };

        if !has_files {
            gate.submit(&dir.path, Reason::EmptyDirectory);
        }
    }
}
