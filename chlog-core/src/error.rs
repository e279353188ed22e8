//! Error types for chlog-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for chlog-core operations.
pub type Result<T> = std::result::Result<T, ChangelogError>;

/// Errors that can escape the pipeline.
///
/// Per-file and per-line failures (missing snapshots, resolver errors,
/// unresolvable changelog targets) are logged and contained; only the
/// variants below ever reach the caller.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// The progress monitor requested cancellation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The directory is not inside a git working copy.
    #[error("Not a git repository: {path}")]
    NotARepository {
        /// Directory that was inspected.
        path: PathBuf,
    },

    /// The git executable could not be started.
    #[error("Failed to run git: {source}")]
    GitLaunch {
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A git invocation exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    Git {
        /// Subcommand that was run.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Output of a version-control command could not be understood.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: String,
        /// Description of the problem.
        message: String,
    },

    /// No formatter registered under the requested preference.
    #[error("Unknown changelog formatter: {name}")]
    UnknownFormatter {
        /// Requested formatter name.
        name: String,
    },

    /// Reading or writing a changelog file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ChangelogError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChangelogError::Io {
            path: path.into(),
            source,
        }
    }
}
