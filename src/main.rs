use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use humansize::{format_size, BINARY};
use repoclean::{engine, ExecutionMode, LocalFs, Options};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Clean a local artifact repository according to a retention policy",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report what a clean run would delete, without touching the repository
    List(RunArgs),
    /// Delete artifacts according to the retention policy
    Clean(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Root of the local artifact repository
    #[arg(long)]
    repository: PathBuf,

    /// Group identifier of the current artifact, dot separated
    #[arg(long)]
    group_id: Option<String>,

    /// Artifact identifier of the current artifact
    #[arg(long)]
    artifact_id: Option<String>,

    /// Apply the retention rules to the current artifact's snapshot versions
    #[arg(long)]
    delete_current_snapshot: bool,

    /// Apply the snapshot retention rules to every artifact in the repository
    #[arg(long)]
    delete_all_snapshots: bool,

    /// Apply the retention rules to the current artifact's release versions
    #[arg(long)]
    delete_current_release: bool,

    /// Age threshold in days for snapshot versions (-1 disables)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    snapshot_retention_delay: i64,

    /// Number of snapshot versions to keep (-1 disables)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    snapshot_versions_retention: i64,

    /// Age threshold in days for release versions (-1 disables)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    release_retention_delay: i64,

    /// Number of release versions to keep (-1 disables)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    release_versions_retention: i64,

    /// Delete every file whose path matches this case-insensitive expression
    #[arg(long)]
    delete_from_regular_expression: Option<String>,

    /// Remove directories left without files after the other passes
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    delete_empty_folders: bool,

    /// Purge the whole repository instead of applying retention rules
    #[arg(long)]
    delete_whole_repository: bool,

    /// Postpone deletions to graceful shutdown instead of deleting inline
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    execute_delete_on_exit: bool,

    /// Whether this invocation is the build's execution root; tree-wide
    /// passes only run from the root
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    execution_root: bool,

    /// Show the effective configuration before running
    #[arg(long, short)]
    verbose: bool,
}

impl RunArgs {
    fn to_options(&self) -> Options {
        Options {
            repository: self.repository.clone(),
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            delete_current_snapshot: self.delete_current_snapshot,
            delete_all_snapshots: self.delete_all_snapshots,
            delete_current_release: self.delete_current_release,
            snapshot_retention_delay: self.snapshot_retention_delay,
            snapshot_versions_retention: self.snapshot_versions_retention,
            release_retention_delay: self.release_retention_delay,
            release_versions_retention: self.release_versions_retention,
            delete_from_regular_expression: self.delete_from_regular_expression.clone(),
            delete_empty_folders: self.delete_empty_folders,
            delete_whole_repository: self.delete_whole_repository,
            execute_delete_on_exit: self.execute_delete_on_exit,
            execution_root: self.execution_root,
        }
    }
}

fn run(args: &RunArgs, mode: ExecutionMode) -> Result<()> {
    if args.verbose {
        println!("Repository: {}", args.repository.display());
        if let (Some(group), Some(artifact)) = (&args.group_id, &args.artifact_id) {
            println!("Artifact: {}:{}", group, artifact);
        }
    }

    let storage = LocalFs;
    let outcome = engine::run(&args.to_options(), mode, &storage)?;

    let count = outcome.report.candidates.len();
    let total = outcome.report.total_bytes();

    match mode {
        ExecutionMode::List => {
            println!(
                "{}",
                format!(
                    "{} deletion candidate(s), {} reclaimable",
                    count,
                    format_size(total, BINARY)
                )
                .bold()
            );
        }
        ExecutionMode::Clean => {
            println!(
                "{}",
                format!(
                    "{} deletion candidate(s), {} reclaimed",
                    count,
                    format_size(total, BINARY)
                )
                .bold()
                .green()
            );
            if !outcome.deferred.is_empty() {
                println!(
                    "{} deletion(s) deferred to shutdown",
                    outcome.deferred.len()
                );
            }
        }
    }

    // Graceful-shutdown flush point for deferred deletions. An abnormal
    // termination before this line abandons the queue and leaves the
    // affected paths on disk.
    outcome.deferred.flush(&storage);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (args, mode) = match &cli.command {
        Command::List(args) => (args, ExecutionMode::List),
        Command::Clean(args) => (args, ExecutionMode::Clean),
    };

    match run(args, mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
