//! The decision pipeline: validate, then purge or classify/evaluate/match,
//! then prune.
//!
//! One linear pass per invocation, no retries, no state persisted between
//! runs. The repository tree on disk is both the input and, in clean mode,
//! the mutated output.

use crate::classify;
use crate::config::{Options, Policy};
use crate::error::CleanError;
use crate::gate::{DeferredQueue, ExecutionGate, ExecutionMode, Reason, RunReport};
use crate::pattern;
use crate::prune;
use crate::retain;
use crate::storage::Storage;
use chrono::Local;

/// What a run produced: the ordered candidate report, plus any deletions
/// postponed to graceful shutdown. Callers flush the queue exactly once,
/// when terminating normally.
#[derive(Debug)]
pub struct Outcome {
    pub report: RunReport,
    pub deferred: DeferredQueue,
}

/// Run the full decision pipeline over the repository.
///
/// Both modes produce identical candidate sets; only clean mode mutates.
/// Fatal validation errors surface before any scan or deletion. Individual
/// deletion failures never do: they are logged at the gate and the run
/// continues.
pub fn run(
    opts: &Options,
    mode: ExecutionMode,
    storage: &dyn Storage,
) -> Result<Outcome, CleanError> {
    let policy = Policy::validate(opts, storage)?;
    let now = Local::now();
    let mut gate = ExecutionGate::new(mode, policy.delete_on_exit, storage);

    // Whole-repository purge short-circuits everything else. It only takes
    // effect for the build's execution root, so sibling modules sharing the
    // repository cannot each race to delete it.
    if policy.delete_whole_repository {
        if policy.execution_root {
            gate.submit(&policy.repository, Reason::WholeRepository);
        }
        return Ok(finish(gate));
    }

    if let Some(coordinate) = &policy.coordinate {
        let artifact_path = coordinate.artifact_path(&policy.repository);
        let dirs = classify::version_directories(storage, &artifact_path);
        let (snapshots, releases) = classify::split(dirs);

        if policy.delete_current_snapshot {
            retain::apply(&snapshots, policy.snapshot, now, &mut gate);
        }

        if policy.delete_current_release {
            retain::apply(&releases, policy.release, now, &mut gate);
        }
    }

    // Tree-wide passes run exactly once per build, from the execution root.
    if policy.execution_root {
        if let Some(expr) = &policy.pattern {
            pattern::apply(storage, &policy.repository, expr, &mut gate);
        }

        if policy.delete_all_snapshots {
            for artifact in classify::snapshot_artifacts(storage, &policy.repository) {
                retain::apply(&artifact.versions, policy.snapshot, now, &mut gate);
            }
        }

        if policy.delete_empty_folders {
            prune::apply(storage, &policy.repository, &mut gate);
        }
    }

    Ok(finish(gate))
}

fn finish(gate: ExecutionGate) -> Outcome {
    let (report, deferred) = gate.finish();
    Outcome { report, deferred }
}
