//! repoclean - retention-driven cleanup of a local artifact repository.
//!
//! Decides, for a tree of versioned artifact directories
//! (`root/<group>/<artifact>/<version>/files`), which directories and files
//! to delete to satisfy a retention policy. The `list` entry point reports
//! the decisions without mutating storage; `clean` performs them. Both run
//! the identical pipeline:
//!
//! - count-keep and age-threshold rules over an artifact's snapshot and
//!   release version directories (`retain`)
//! - regular-expression matching over the repository's file paths
//!   (`pattern`)
//! - empty-directory reclamation, deepest first, after all other passes
//!   (`prune`)
//! - an optional whole-repository purge that bypasses everything else
//!
//! Every candidate flows through a single execution gate (`gate`) that
//! handles list-vs-clean semantics, best-effort deletion and optional
//! deferral to graceful shutdown.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod prune;
pub mod retain;
pub mod storage;

pub use classify::{ArtifactSnapshots, VersionDirectory, SNAPSHOT_SUFFIX};
pub use config::{ArtifactCoordinate, Options, Policy, Retention, DISABLED};
pub use engine::{run, Outcome};
pub use error::CleanError;
pub use gate::{Candidate, DeferredQueue, ExecutionGate, ExecutionMode, Reason, RunReport};
pub use storage::{Entry, LocalFs, Storage};
