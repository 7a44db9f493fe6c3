//! Error taxonomy for cleanup runs.

use thiserror::Error;

/// Fatal errors raised during validation, before any scan or deletion.
///
/// Per-candidate deletion failures are not part of this taxonomy: deletion is
/// best-effort, so I/O failures while removing a specific path are logged and
/// swallowed rather than surfaced as a run failure.
#[derive(Debug, Error)]
pub enum CleanError {
    /// Repository root missing or not writable.
    #[error("{0}")]
    Environment(String),

    /// Invalid retention value or regular expression.
    #[error("{0}")]
    Configuration(String),
}
