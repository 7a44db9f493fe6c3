//! Engine-level tests over a repository fixture on disk.
//!
//! The fixture mirrors a small local repository: one unrelated plugin
//! artifact aged seven days, and a `test-example` artifact with release
//! versions 1.0/2.0/3.0 and snapshot versions 1.0/2.0/3.0-SNAPSHOT aged
//! one, two and three days respectively.

use repoclean::{engine, ExecutionMode, LocalFs, Options, Reason};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct Fixture {
    repo: TempDir,
    plugin: PathBuf,
    releases: [PathBuf; 3],
    snapshots: [PathBuf; 3],
}

impl Fixture {
    fn root(&self) -> &Path {
        self.repo.path()
    }
}

fn age_file(path: &Path, days: u64) {
    let mtime = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(mtime).unwrap();
}

fn create_artifact(root: &Path, relative: &str, age_days: u64) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "artifact").unwrap();
    age_file(&path, age_days);
    path
}

fn fixture() -> Fixture {
    let repo = tempfile::tempdir().unwrap();
    let root = repo.path().to_path_buf();

    let plugin = create_artifact(
        &root,
        "org/maven/plugins/plugin-example/1.0/plugin-example-1.0.jar",
        7,
    );
    let releases = [
        create_artifact(&root, "org/maven/test/test-example/1.0/test-example-1.0.jar", 1),
        create_artifact(&root, "org/maven/test/test-example/2.0/test-example-2.0.jar", 2),
        create_artifact(&root, "org/maven/test/test-example/3.0/test-example-3.0.jar", 3),
    ];
    let snapshots = [
        create_artifact(
            &root,
            "org/maven/test/test-example/1.0-SNAPSHOT/test-example-1.0-SNAPSHOT.jar",
            1,
        ),
        create_artifact(
            &root,
            "org/maven/test/test-example/2.0-SNAPSHOT/test-example-2.0-SNAPSHOT.jar",
            2,
        ),
        create_artifact(
            &root,
            "org/maven/test/test-example/3.0-SNAPSHOT/test-example-3.0-SNAPSHOT.jar",
            3,
        ),
    ];

    Fixture {
        repo,
        plugin,
        releases,
        snapshots,
    }
}

/// Base options for the fixture: deletions inline, pruning off, so each
/// test exercises exactly one pass.
fn options(root: &Path) -> Options {
    Options {
        repository: root.to_path_buf(),
        group_id: Some("org.maven.test".to_string()),
        artifact_id: Some("test-example".to_string()),
        execute_delete_on_exit: false,
        delete_empty_folders: false,
        ..Options::default()
    }
}

fn clean(opts: &Options) -> repoclean::Outcome {
    engine::run(opts, ExecutionMode::Clean, &LocalFs).unwrap()
}

#[test]
fn snapshot_count_retention_keeps_the_first_two() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.snapshot_versions_retention = 2;

    clean(&opts);

    assert!(fx.snapshots[0].exists());
    assert!(fx.snapshots[1].exists());
    assert!(!fx.snapshots[2].exists());
    for release in &fx.releases {
        assert!(release.exists());
    }
    assert!(fx.plugin.exists());
}

#[test]
fn snapshot_retention_delay_deletes_strictly_older() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.snapshot_retention_delay = 1;
    opts.snapshot_versions_retention = 10000;

    clean(&opts);

    assert!(fx.snapshots[0].exists());
    assert!(!fx.snapshots[1].exists());
    assert!(!fx.snapshots[2].exists());
    for release in &fx.releases {
        assert!(release.exists());
    }
}

#[test]
fn release_retention_delay_deletes_strictly_older() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_release = true;
    opts.release_retention_delay = 2;
    opts.release_versions_retention = 10000;

    clean(&opts);

    assert!(fx.releases[0].exists());
    assert!(fx.releases[1].exists());
    assert!(!fx.releases[2].exists());
    for snapshot in &fx.snapshots {
        assert!(snapshot.exists());
    }
}

#[test]
fn age_equal_to_the_threshold_is_kept() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_release = true;
    opts.release_retention_delay = 3;
    opts.release_versions_retention = 10000;

    clean(&opts);

    for release in &fx.releases {
        assert!(release.exists());
    }
}

#[test]
fn release_count_zero_deletes_every_release() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_release = true;
    opts.release_versions_retention = 0;

    clean(&opts);

    for release in &fx.releases {
        assert!(!release.exists());
    }
    for snapshot in &fx.snapshots {
        assert!(snapshot.exists());
    }
    assert!(fx.plugin.exists());
}

#[test]
fn disabled_rules_delete_nothing() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.delete_current_release = true;
    opts.snapshot_retention_delay = 10000;
    opts.snapshot_versions_retention = -1;
    opts.release_retention_delay = 10000;
    opts.release_versions_retention = -1;

    let outcome = clean(&opts);

    assert!(outcome.report.candidates.is_empty());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(path.exists());
    }
}

#[test]
fn expression_deletes_only_matching_files() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*plugin-example.*".to_string());

    clean(&opts);

    assert!(!fx.plugin.exists());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(path.exists());
    }
}

#[test]
fn anchored_expression_matches_under_a_relative_root() {
    let fx = fixture();
    let resolved_root = fs::canonicalize(fx.root()).unwrap();

    // Hand the engine the root as a bare directory name; the expression is
    // anchored at the filesystem root, so it can only match if paths are
    // resolved to absolute form before matching.
    std::env::set_current_dir(fx.root().parent().unwrap()).unwrap();
    let mut opts = options(Path::new(fx.root().file_name().unwrap()));
    opts.delete_from_regular_expression = Some(format!(
        "^{}.*plugin-example.*",
        regex::escape(&resolved_root.to_string_lossy())
    ));

    let outcome = clean(&opts);

    assert!(outcome
        .report
        .candidates
        .iter()
        .any(|c| c.reason == Reason::PatternMatch));
    assert!(!fx.plugin.exists());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(path.exists());
    }
}

#[test]
fn expression_matching_is_case_insensitive() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*PLUGIN-EXAMPLE.*".to_string());

    clean(&opts);

    assert!(!fx.plugin.exists());
}

#[test]
fn expression_covering_everything_else_spares_the_plugin() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*test-example.*".to_string());

    clean(&opts);

    assert!(fx.plugin.exists());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(!path.exists());
    }
}

#[test]
fn empty_folders_are_pruned_when_enabled() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*plugin-example.*".to_string());
    opts.delete_empty_folders = true;

    clean(&opts);

    assert!(!fx.plugin.exists());
    // The version directory and the artifact directory above it are both
    // left without files and collapse bottom-up.
    assert!(!fx.root().join("org/maven/plugins/plugin-example/1.0").exists());
    assert!(!fx.root().join("org/maven/plugins/plugin-example").exists());
    // The sibling subtree still holds files and survives.
    assert!(fx.releases[0].exists());
}

#[test]
fn empty_folders_stay_when_pruning_is_disabled() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*plugin-example.*".to_string());
    opts.delete_empty_folders = false;

    clean(&opts);

    assert!(!fx.plugin.exists());
    assert!(fx.root().join("org/maven/plugins/plugin-example/1.0").exists());
}

#[test]
fn default_policy_keeps_one_version_of_the_current_artifact() {
    let fx = fixture();
    let opts = options(fx.root());

    clean(&opts);

    assert!(fx.releases[0].exists());
    assert!(!fx.releases[1].exists());
    assert!(!fx.releases[2].exists());
    assert!(fx.snapshots[0].exists());
    assert!(!fx.snapshots[1].exists());
    assert!(!fx.snapshots[2].exists());
    // Scoped to the current artifact only.
    assert!(fx.plugin.exists());
}

#[test]
fn default_policy_equals_explicit_seven_days_keep_one() {
    let implicit_fx = fixture();
    let implicit_opts = options(implicit_fx.root());

    let explicit_fx = fixture();
    let mut explicit_opts = options(explicit_fx.root());
    explicit_opts.delete_current_snapshot = true;
    explicit_opts.delete_current_release = true;
    explicit_opts.snapshot_retention_delay = 7;
    explicit_opts.snapshot_versions_retention = 1;
    explicit_opts.release_retention_delay = 7;
    explicit_opts.release_versions_retention = 1;

    let implicit = clean(&implicit_opts);
    let explicit = clean(&explicit_opts);

    // Candidate paths carry the resolved repository root.
    let relativize = |outcome: &repoclean::Outcome, root: &Path| -> Vec<(PathBuf, Reason)> {
        let root = fs::canonicalize(root).unwrap();
        outcome
            .report
            .candidates
            .iter()
            .map(|c| (c.path.strip_prefix(&root).unwrap().to_path_buf(), c.reason))
            .collect()
    };

    assert_eq!(
        relativize(&implicit, implicit_fx.root()),
        relativize(&explicit, explicit_fx.root())
    );
}

#[test]
fn all_snapshots_pass_reaches_every_artifact() {
    let fx = fixture();
    let other = create_artifact(
        fx.root(),
        "org/other/thing/1.0-SNAPSHOT/thing-1.0-SNAPSHOT.jar",
        5,
    );

    let mut opts = options(fx.root());
    opts.delete_all_snapshots = true;
    opts.snapshot_versions_retention = 0;
    opts.delete_current_snapshot = false;

    clean(&opts);

    assert!(!other.exists());
    for snapshot in &fx.snapshots {
        assert!(!snapshot.exists());
    }
    for release in &fx.releases {
        assert!(release.exists());
    }
}

#[test]
fn all_snapshots_pass_is_skipped_off_the_execution_root() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_all_snapshots = true;
    opts.snapshot_versions_retention = 0;
    opts.execution_root = false;

    clean(&opts);

    for snapshot in &fx.snapshots {
        assert!(snapshot.exists());
    }
}

#[test]
fn list_mode_never_mutates_and_is_idempotent() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.delete_current_release = true;
    opts.snapshot_versions_retention = 0;
    opts.release_versions_retention = 0;
    opts.delete_from_regular_expression = Some(".*".to_string());
    opts.delete_empty_folders = true;

    let first = engine::run(&opts, ExecutionMode::List, &LocalFs).unwrap();
    let second = engine::run(&opts, ExecutionMode::List, &LocalFs).unwrap();

    assert_eq!(first.report, second.report);
    assert!(!first.report.candidates.is_empty());
    assert!(first.deferred.is_empty());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(path.exists());
    }
    assert!(fx.plugin.exists());
}

#[test]
fn list_then_clean_produces_the_same_candidates() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.snapshot_versions_retention = 1;

    let listed = engine::run(&opts, ExecutionMode::List, &LocalFs).unwrap();
    let cleaned = clean(&opts);

    let paths = |outcome: &repoclean::Outcome| -> Vec<PathBuf> {
        outcome.report.candidates.iter().map(|c| c.path.clone()).collect()
    };
    assert_eq!(paths(&listed), paths(&cleaned));
}

#[test]
fn whole_repository_purge_removes_the_root() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_whole_repository = true;

    let outcome = clean(&opts);

    assert!(!fx.root().exists());
    assert_eq!(outcome.report.candidates.len(), 1);
    assert_eq!(outcome.report.candidates[0].reason, Reason::WholeRepository);
}

#[test]
fn whole_repository_purge_is_a_no_op_off_the_execution_root() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_whole_repository = true;
    opts.execution_root = false;

    let outcome = clean(&opts);

    assert!(fx.root().exists());
    assert!(outcome.report.candidates.is_empty());
}

#[test]
fn deferred_deletions_only_happen_at_flush() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.snapshot_versions_retention = 0;
    opts.execute_delete_on_exit = true;

    let outcome = clean(&opts);

    // Nothing is physically removed until the shutdown flush.
    for snapshot in &fx.snapshots {
        assert!(snapshot.exists());
    }
    assert_eq!(outcome.deferred.len(), 3);

    outcome.deferred.flush(&LocalFs);
    for snapshot in &fx.snapshots {
        assert!(!snapshot.exists());
    }
}

#[test]
fn deferred_deletions_are_invisible_to_the_pruner_in_the_same_run() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_from_regular_expression = Some(".*plugin-example.*".to_string());
    opts.delete_empty_folders = true;
    opts.execute_delete_on_exit = true;

    let outcome = clean(&opts);

    // The plugin jar is queued, so its directory still holds a file when
    // the empty-directory pass runs and is not flagged.
    let plugin_version_dir =
        fs::canonicalize(fx.root()).unwrap().join("org/maven/plugins/plugin-example/1.0");
    assert!(!outcome
        .report
        .candidates
        .iter()
        .any(|c| c.reason == Reason::EmptyDirectory && c.path == plugin_version_dir));

    outcome.deferred.flush(&LocalFs);
    assert!(!fx.plugin.exists());
    // The now-empty directory is reclaimed by the next run's pruning pass.
    assert!(fx.root().join("org/maven/plugins/plugin-example/1.0").exists());
}

#[test]
fn validation_failures_surface_before_any_deletion() {
    let fx = fixture();
    let mut opts = options(fx.root());
    opts.delete_current_snapshot = true;
    opts.snapshot_versions_retention = -2;

    assert!(engine::run(&opts, ExecutionMode::Clean, &LocalFs).is_err());
    for path in fx.releases.iter().chain(&fx.snapshots) {
        assert!(path.exists());
    }
}
