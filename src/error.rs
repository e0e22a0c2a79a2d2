//! Error types for gitwrapper
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for gitwrapper
#[derive(Error, Debug)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if this is a git subprocess that exited with a non-zero status
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Error::Git(GitError::CommandFailed { .. }))
    }

    /// Captured output of a failed git command, if any
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Error::Git(e) => e.output(),
            _ => None,
        }
    }
}

/// Git operations errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Path not in the git repository: {0}")]
    PathOutsideRepository(PathBuf),

    #[error("Git command failed: {command} (exit code {exit_code}) - {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Git is not installed or not in PATH")]
    NotInstalled,

    #[error("Git command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Failed to run git: {0}")]
    SpawnFailed(String),

    #[error("Unexpected git output: {0}")]
    UnexpectedOutput(String),

    #[error("Comparison needs 1 or 2 treeishes, got {0}")]
    InvalidComparison(usize),
}

impl GitError {
    /// Captured output of a failed git command
    pub fn output(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { output, .. } => Some(output.as_str()),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
