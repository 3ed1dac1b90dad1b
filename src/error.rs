//! Error types for cascade-merge

use thiserror::Error;

/// Errors produced while resolving and executing a cascade
#[derive(Debug, Error)]
pub enum Error {
    /// Bitbucket API returned an unexpected response
    #[error("bitbucket API error: {0}")]
    Bitbucket(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A git command exited with a failure status
    #[error("git command failed: {command}\nstderr: {stderr}")]
    Git {
        /// The command line that failed
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// IO failure (spawning git, creating directories, ...)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled before it completed
    #[error("operation cancelled")]
    Cancelled,

    /// Repository links carry no clone entries
    #[error("missing clone link")]
    MissingCloneLink,

    /// No clone link matches the requested protocols
    #[error("no matching clone link")]
    NoMatchingCloneLink,

    /// The branching model has no release branch type
    #[error("branching model of {0} has no release branch type")]
    MissingReleaseBranchType(String),

    /// A branch expected to be part of the cascade is absent
    #[error("branch '{0}' is not part of the cascade")]
    BranchNotInCascade(String),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
