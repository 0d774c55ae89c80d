//! Unified error types for ghpages-publish.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for setting up and driving a publish run.
///
/// Failures of individual steps are recorded in the report rather than
/// returned through this type.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("`{command}` failed{}: {stderr}", .exit_code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected git output for `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

impl GitError {
    /// Exit code of the failed git command, if it produced one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Command { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

/// External process errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write run log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while moving generated site files around
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Build output not found: {0}")]
    OutputMissing(PathBuf),

    #[error("Failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, PublishError>;

/// Result type alias for Git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type alias for process execution
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Result type alias for site file operations
pub type SiteResult<T> = std::result::Result<T, SiteError>;
