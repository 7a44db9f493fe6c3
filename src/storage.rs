//! Filesystem gateway.
//!
//! Every listing, stat and delete in the engine goes through the [`Storage`]
//! trait, so the decision pipeline can be exercised against fixture trees
//! without hard-coding real-filesystem assumptions into each pass.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// One child of a directory listing.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub modified: SystemTime,
}

/// Listing, stat and delete primitives required by the engine.
pub trait Storage {
    /// Immediate children of `path`, in no particular order.
    fn list_children(&self, path: &Path) -> io::Result<Vec<Entry>>;

    /// True when the path currently exists on disk.
    fn exists(&self, path: &Path) -> bool;

    /// True when the path can be written to.
    ///
    /// The local implementation only inspects the readonly permission bit:
    /// a directory owned by another user can pass this check and still
    /// refuse deletions, which then fail best-effort at the gate instead of
    /// aborting the run up front. A stricter probe would have to attempt a
    /// mutation, which validation must not do.
    fn writable(&self, path: &Path) -> bool;

    /// Resolve a path to its absolute, symlink-free form.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Total size in bytes of all files under `path` (0 when missing).
    fn size_of(&self, path: &Path) -> u64;

    /// Remove a single file.
    fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    fn delete_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory only if it has no remaining children.
    fn delete_empty_dir(&self, path: &Path) -> io::Result<()>;
}

/// Storage backed by the real filesystem.
pub struct LocalFs;

impl Storage for LocalFs {
    fn list_children(&self, path: &Path) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // symlink_metadata avoids following symlinks out of the repository
            let metadata = fs::symlink_metadata(entry.path())?;
            entries.push(Entry {
                path: entry.path(),
                is_dir: metadata.is_dir(),
                modified: metadata.modified()?,
            });
        }

        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn writable(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn size_of(&self, path: &Path) -> u64 {
        let mut total = 0u64;

        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                if let Ok(metadata) = entry.metadata() {
                    total += metadata.len();
                }
            }
        }

        total
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn delete_empty_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}

/// Recursive listing of every file under `root`, sorted by path.
pub fn files_under(storage: &dyn Storage, root: &Path) -> Vec<Entry> {
    let mut files = Vec::new();
    collect(storage, root, &mut files, &mut Vec::new());
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Recursive listing of every directory under `root` (root excluded),
/// sorted by path.
pub fn dirs_under(storage: &dyn Storage, root: &Path) -> Vec<Entry> {
    let mut dirs = Vec::new();
    collect(storage, root, &mut Vec::new(), &mut dirs);
    dirs.sort_by(|a, b| a.path.cmp(&b.path));
    dirs
}

fn collect(storage: &dyn Storage, path: &Path, files: &mut Vec<Entry>, dirs: &mut Vec<Entry>) {
    let children = match storage.list_children(path) {
        Ok(children) => children,
        Err(err) => {
            eprintln!("Warning: failed to read directory {}: {}", path.display(), err);
            return;
        }
    };

    for child in children {
        if child.is_dir {
            let child_path = child.path.clone();
            dirs.push(child);
            collect(storage, &child_path, files, dirs);
        } else {
            files.push(child);
        }
    }
}
