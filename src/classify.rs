//! Version directory discovery and snapshot/release classification.

use crate::storage::{dirs_under, Storage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name suffix marking a version directory as a snapshot.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Immutable snapshot of one version directory, taken at scan time.
///
/// Later deletion invalidates it, but the engine never re-reads a directory
/// mid-pass: every rule works from this scan-time view.
#[derive(Debug, Clone)]
pub struct VersionDirectory {
    pub name: String,
    pub path: PathBuf,
    /// Last-modified time of the first contained file in name order, or of
    /// the directory itself when it holds no files.
    pub modified: SystemTime,
    /// Immediate child files, sorted by name.
    pub files: Vec<PathBuf>,
}

impl VersionDirectory {
    pub fn is_snapshot(&self) -> bool {
        self.name.ends_with(SNAPSHOT_SUFFIX)
    }
}

/// All snapshot version directories of one artifact, for the
/// repository-wide pass.
#[derive(Debug, Clone)]
pub struct ArtifactSnapshots {
    pub artifact_path: PathBuf,
    pub versions: Vec<VersionDirectory>,
}

/// List the immediate child version directories of an artifact path.
///
/// The result is ordered by a stable, purely lexical comparison of the
/// directory names. Version strings are deliberately not parsed: `10.0`
/// sorts before `2.0`, exactly as a reader of the candidate log sees the
/// tree, and every downstream rule consumes this ordering unchanged.
pub fn version_directories(storage: &dyn Storage, artifact_path: &Path) -> Vec<VersionDirectory> {
    let children = match storage.list_children(artifact_path) {
        Ok(children) => children,
        // A missing or unreadable artifact path just yields nothing to clean.
        Err(_) => return Vec::new(),
    };

    let mut dirs: Vec<VersionDirectory> = children
        .iter()
        .filter(|child| child.is_dir)
        .map(|child| snapshot_of_directory(storage, &child.path, child.modified))
        .collect();

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    dirs
}

/// Split an ordered sequence into its snapshot and release subsets,
/// preserving the established order within each.
pub fn split(dirs: Vec<VersionDirectory>) -> (Vec<VersionDirectory>, Vec<VersionDirectory>) {
    dirs.into_iter().partition(|dir| dir.is_snapshot())
}

/// Repository-wide variant: group every snapshot version directory under the
/// root by its immediate parent artifact directory.
pub fn snapshot_artifacts(storage: &dyn Storage, root: &Path) -> Vec<ArtifactSnapshots> {
    let mut groups: BTreeMap<PathBuf, Vec<VersionDirectory>> = BTreeMap::new();

    // dirs_under is path-sorted, so each artifact's version directories
    // arrive already in lexical name order.
    for entry in dirs_under(storage, root) {
        let name = match entry.path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !name.ends_with(SNAPSHOT_SUFFIX) {
            continue;
        }
        let parent = match entry.path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => continue,
        };

        let version = snapshot_of_directory(storage, &entry.path, entry.modified);
        groups.entry(parent).or_default().push(version);
    }

    groups
        .into_iter()
        .map(|(artifact_path, versions)| ArtifactSnapshots {
            artifact_path,
            versions,
        })
        .collect()
}

fn snapshot_of_directory(
    storage: &dyn Storage,
    path: &Path,
    dir_modified: SystemTime,
) -> VersionDirectory {
    let mut files: Vec<_> = storage
        .list_children(path)
        .unwrap_or_default()
        .into_iter()
        .filter(|child| !child.is_dir)
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let modified = files.first().map(|f| f.modified).unwrap_or(dir_modified);

    VersionDirectory {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        modified,
        files: files.into_iter().map(|f| f.path).collect(),
    }
}
