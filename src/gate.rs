//! The single gate every deletion candidate passes through.
//!
//! List mode logs what a clean run would do and never touches the
//! filesystem. Clean mode logs the mutating verb and deletes best-effort:
//! an I/O failure on one candidate is logged and the pass moves on.
//!
//! With deferral enabled, clean-mode deletions are registered on a queue
//! flushed at graceful shutdown instead of executed immediately. Within the
//! same run, a later pass may therefore still observe a file whose deletion
//! is pending; the empty-directory pass in particular will not flag a
//! directory whose last file is queued for deferred removal. That same-run
//! inconsistency is the original, intended trade-off favoring crash safety,
//! and is deliberately not hidden here.

use crate::storage::Storage;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Whether a run reports only or also mutates. Orthogonal to every other
/// component: both modes must produce identical candidate sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Report deletion candidates without mutating storage.
    List,
    /// Report and delete.
    Clean,
}

/// Why a candidate was flagged. Feeds the log line and selects the deletion
/// primitive; never part of decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    CountExpired,
    AgeExpired,
    PatternMatch,
    EmptyDirectory,
    WholeRepository,
}

/// Which deletion primitive a candidate requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    File,
    /// Recursive removal of a directory tree.
    DirRecursive,
    /// Non-recursive removal; fails when children remain, which the
    /// best-effort policy tolerates.
    DirIfEmpty,
}

impl Reason {
    pub fn delete_kind(&self) -> DeleteKind {
        match self {
            Reason::PatternMatch => DeleteKind::File,
            Reason::EmptyDirectory => DeleteKind::DirIfEmpty,
            Reason::CountExpired | Reason::AgeExpired | Reason::WholeRepository => {
                DeleteKind::DirRecursive
            }
        }
    }
}

/// One flagged path, as emitted to the log and the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub reason: Reason,
    /// Size of the files the candidate covers, for the reclaimed-space
    /// summary.
    pub bytes: u64,
}

/// Ordered record of every candidate a run emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: Vec<Candidate>,
}

impl RunReport {
    pub fn total_bytes(&self) -> u64 {
        self.candidates.iter().map(|c| c.bytes).sum()
    }
}

/// Deletions postponed to graceful shutdown. Abnormal termination abandons
/// the queue and leaves the paths on disk, favoring safety over
/// completeness.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: Vec<(PathBuf, DeleteKind)>,
}

impl DeferredQueue {
    fn register(&mut self, path: PathBuf, kind: DeleteKind) {
        self.pending.push((path, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Execute every registered deletion, in registration order. This is the
    /// one flush point; callers invoke it once at graceful shutdown.
    pub fn flush(self, storage: &dyn Storage) {
        for (path, kind) in self.pending {
            delete_best_effort(storage, &path, kind);
        }
    }
}

/// Wraps every candidate deletion with list-vs-clean semantics.
pub struct ExecutionGate<'a> {
    mode: ExecutionMode,
    defer: bool,
    storage: &'a dyn Storage,
    deferred: DeferredQueue,
    report: RunReport,
}

impl<'a> ExecutionGate<'a> {
    pub fn new(mode: ExecutionMode, defer: bool, storage: &'a dyn Storage) -> Self {
        ExecutionGate {
            mode,
            defer,
            storage,
            deferred: DeferredQueue::default(),
            report: RunReport::default(),
        }
    }

    /// Log one candidate, record it in the report, and delete it when the
    /// mode allows (immediately or via the deferred queue).
    pub fn submit(&mut self, path: &Path, reason: Reason) {
        // An empty directory covers no files by definition; measuring it
        // would count files of surviving subtrees below it.
        let bytes = if reason == Reason::EmptyDirectory {
            0
        } else {
            self.storage.size_of(path)
        };

        println!("{}", log_line(self.mode, reason, path));

        self.report.candidates.push(Candidate {
            path: path.to_path_buf(),
            reason,
            bytes,
        });

        if self.mode == ExecutionMode::Clean {
            if self.defer {
                self.deferred.register(path.to_path_buf(), reason.delete_kind());
            } else {
                delete_best_effort(self.storage, path, reason.delete_kind());
            }
        }
    }

    pub fn finish(self) -> (RunReport, DeferredQueue) {
        (self.report, self.deferred)
    }
}

/// Delete one path, tolerating failure.
///
/// A path that is already gone is success: a directory flagged by both
/// retention rules is submitted twice and must not log the second attempt
/// as a failure. Everything else (permissions, locked handles, non-empty
/// directories in the empty-directory pass) is logged and skipped.
fn delete_best_effort(storage: &dyn Storage, path: &Path, kind: DeleteKind) {
    let result = match kind {
        DeleteKind::File => storage.delete_file(path),
        DeleteKind::DirRecursive => storage.delete_dir(path),
        DeleteKind::DirIfEmpty => storage.delete_empty_dir(path),
    };

    if let Err(err) = result {
        if err.kind() == ErrorKind::NotFound {
            return;
        }
        eprintln!(
            "Warning: failed to delete {}: {}. Skipping.",
            path.display(),
            err
        );
    }
}

fn log_line(mode: ExecutionMode, reason: Reason, path: &Path) -> String {
    let verb = match (mode, reason) {
        (ExecutionMode::List, Reason::CountExpired) => {
            "Would delete version directory (retention count exceeded)"
        }
        (ExecutionMode::List, Reason::AgeExpired) => {
            "Would delete version directory (retention delay expired)"
        }
        (ExecutionMode::List, Reason::PatternMatch) => "Would delete matching file",
        (ExecutionMode::List, Reason::EmptyDirectory) => "Would delete empty directory",
        (ExecutionMode::List, Reason::WholeRepository) => "Would purge repository",
        (ExecutionMode::Clean, Reason::CountExpired) => {
            "Deleting version directory (retention count exceeded)"
        }
        (ExecutionMode::Clean, Reason::AgeExpired) => {
            "Deleting version directory (retention delay expired)"
        }
        (ExecutionMode::Clean, Reason::PatternMatch) => "Deleting matching file",
        (ExecutionMode::Clean, Reason::EmptyDirectory) => "Deleting empty directory",
        (ExecutionMode::Clean, Reason::WholeRepository) => "Purging repository",
    };

    format!("{}: {}", verb, path.display())
}
