//! Retention parameters: raw options, validation and default synthesis.

use crate::error::CleanError;
use crate::pattern;
use crate::storage::Storage;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Sentinel value disabling a retention rule. Any other negative value is a
/// configuration error.
pub const DISABLED: i64 = -1;

/// Coordinates of the artifact the current invocation runs for. Only used to
/// compute the scan path under the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl ArtifactCoordinate {
    /// Path of the artifact's version directories:
    /// `root/<group id as path segments>/<artifact id>`.
    pub fn artifact_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.group_id.split('.') {
            path.push(segment);
        }
        path.push(&self.artifact_id);
        path
    }
}

/// Per-subset retention knobs, applied independently to the snapshot and
/// release subsets of an artifact's version directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Age threshold in whole days; [`DISABLED`] turns the age rule off.
    pub delay_days: i64,
    /// Number of first-ordered versions to keep; [`DISABLED`] turns the
    /// count rule off.
    pub keep_count: i64,
}

impl Retention {
    pub fn is_disabled(&self) -> bool {
        self.delay_days == DISABLED && self.keep_count == DISABLED
    }
}

/// Raw, unvalidated run parameters as supplied by the caller.
#[derive(Debug, Clone)]
pub struct Options {
    pub repository: PathBuf,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub delete_current_snapshot: bool,
    pub delete_all_snapshots: bool,
    pub delete_current_release: bool,
    pub snapshot_retention_delay: i64,
    pub snapshot_versions_retention: i64,
    pub release_retention_delay: i64,
    pub release_versions_retention: i64,
    pub delete_from_regular_expression: Option<String>,
    pub delete_empty_folders: bool,
    pub delete_whole_repository: bool,
    pub execute_delete_on_exit: bool,
    pub execution_root: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            repository: PathBuf::new(),
            group_id: None,
            artifact_id: None,
            delete_current_snapshot: false,
            delete_all_snapshots: false,
            delete_current_release: false,
            snapshot_retention_delay: DISABLED,
            snapshot_versions_retention: DISABLED,
            release_retention_delay: DISABLED,
            release_versions_retention: DISABLED,
            delete_from_regular_expression: None,
            delete_empty_folders: true,
            delete_whole_repository: false,
            execute_delete_on_exit: true,
            execution_root: true,
        }
    }
}

/// Immutable, validated configuration. Constructed once by
/// [`Policy::validate`] and threaded through every component call.
#[derive(Debug, Clone)]
pub struct Policy {
    pub repository: PathBuf,
    pub coordinate: Option<ArtifactCoordinate>,
    pub delete_current_snapshot: bool,
    pub delete_all_snapshots: bool,
    pub delete_current_release: bool,
    pub snapshot: Retention,
    pub release: Retention,
    pub pattern: Option<Regex>,
    pub delete_empty_folders: bool,
    pub delete_whole_repository: bool,
    pub delete_on_exit: bool,
    pub execution_root: bool,
}

impl Policy {
    /// Normalize and validate raw options.
    ///
    /// Fails with [`CleanError::Environment`] when the repository root does
    /// not exist or is not writable, and with [`CleanError::Configuration`]
    /// for a retention value below `-1` or a regular expression that does not
    /// compile. The only filesystem access is the existence/writability probe
    /// on the root; nothing is mutated.
    pub fn validate(opts: &Options, storage: &dyn Storage) -> Result<Policy, CleanError> {
        if !storage.exists(&opts.repository) {
            return Err(CleanError::Environment(format!(
                "repository root does not exist: {}",
                opts.repository.display()
            )));
        }

        // Resolve the root once so every downstream path, and therefore
        // every log line and every string the expression is tested against,
        // is absolute regardless of how the root was supplied.
        let repository = storage.canonicalize(&opts.repository).map_err(|err| {
            CleanError::Environment(format!(
                "repository root cannot be resolved: {}: {}",
                opts.repository.display(),
                err
            ))
        })?;

        if !storage.writable(&repository) {
            return Err(CleanError::Environment(format!(
                "repository root is not writable: {}",
                repository.display()
            )));
        }

        check_retention_value("snapshot-retention-delay", opts.snapshot_retention_delay)?;
        check_retention_value(
            "snapshot-versions-retention",
            opts.snapshot_versions_retention,
        )?;
        check_retention_value("release-retention-delay", opts.release_retention_delay)?;
        check_retention_value("release-versions-retention", opts.release_versions_retention)?;

        let pattern = match &opts.delete_from_regular_expression {
            Some(expr) => Some(pattern::compile(expr).map_err(|err| {
                CleanError::Configuration(format!(
                    "delete-from-regular-expression does not compile: {}",
                    err
                ))
            })?),
            None => None,
        };

        let mut snapshot = Retention {
            delay_days: opts.snapshot_retention_delay,
            keep_count: opts.snapshot_versions_retention,
        };
        let mut release = Retention {
            delay_days: opts.release_retention_delay,
            keep_count: opts.release_versions_retention,
        };
        let mut delete_current_snapshot = opts.delete_current_snapshot;
        let mut delete_current_release = opts.delete_current_release;

        // With no retention value, no expression and no purge requested, a
        // bare invocation still performs a sane, scoped cleanup: keep one
        // version and seven days of history for the current artifact only.
        if snapshot.is_disabled()
            && release.is_disabled()
            && pattern.is_none()
            && !opts.delete_whole_repository
        {
            snapshot = Retention {
                delay_days: 7,
                keep_count: 1,
            };
            release = snapshot;
            delete_current_snapshot = true;
            delete_current_release = true;
        }

        let coordinate = match (&opts.group_id, &opts.artifact_id) {
            (Some(group_id), Some(artifact_id)) => Some(ArtifactCoordinate {
                group_id: group_id.clone(),
                artifact_id: artifact_id.clone(),
            }),
            _ => None,
        };

        if (delete_current_snapshot || delete_current_release) && coordinate.is_none() {
            return Err(CleanError::Configuration(
                "group-id and artifact-id are required to clean the current artifact".to_string(),
            ));
        }

        Ok(Policy {
            repository,
            coordinate,
            delete_current_snapshot,
            delete_all_snapshots: opts.delete_all_snapshots,
            delete_current_release,
            snapshot,
            release,
            pattern,
            delete_empty_folders: opts.delete_empty_folders,
            delete_whole_repository: opts.delete_whole_repository,
            delete_on_exit: opts.execute_delete_on_exit,
            execution_root: opts.execution_root,
        })
    }
}

fn check_retention_value(name: &str, value: i64) -> Result<(), CleanError> {
    if value < DISABLED {
        return Err(CleanError::Configuration(format!(
            "{} must be -1 (disabled) or a non-negative number, got: {}",
            name, value
        )));
    }
    Ok(())
}
