//! Local git operations for the cascade
//!
//! Each repository gets one working copy under the configured work
//! directory, keyed by repository UUID and reused between events. Working
//! copies are only ever touched by the single cascade worker, so no locking
//! happens here.

mod working_copy;

pub use working_copy::{GitWorkingCopy, GitWorkspaces};

use crate::error::{Error, Result};
use crate::types::RepoRef;
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Outcome of merging one branch into the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    /// A merge commit was created and pushed
    Merged,
    /// Target already contained the source; nothing pushed
    UpToDate,
    /// The merge could not be completed automatically
    Conflict {
        /// Files left unmerged
        conflicting_files: Vec<String>,
    },
}

/// Identity used for merge commits, passed via `-c` flags
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    /// The committer/author name (git `user.name`)
    pub name: String,
    /// The committer/author email (git `user.email`)
    pub email: String,
}

/// Credentials for HTTP(S) remotes
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password or app password
    pub password: String,
}

/// A local clone that branches can be merged in
#[async_trait]
pub trait WorkingCopy: Send + Sync {
    /// Names of all branches on the remote, as of the last fetch
    async fn list_branches(&self) -> Result<Vec<String>>;

    /// Merge `current` into `next` and push `next`.
    ///
    /// Conflicts are reported as [`MergeStatus::Conflict`]; errors are
    /// reserved for infrastructure failures.
    async fn merge_branch(
        &self,
        current: &str,
        next: &str,
        cancel: &CancellationToken,
    ) -> Result<MergeStatus>;
}

/// Opens (cloning or refreshing) the working copy of a repository
#[async_trait]
pub trait WorkspaceProvider: Send + Sync {
    /// Prepare an up-to-date working copy of `repo`
    async fn open(
        &self,
        repo: &RepoRef,
        clone_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn WorkingCopy>>;
}

/// Create a git Command with clean environment (no system/user config).
pub(crate) fn git_command(workdir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    // merge output is parsed
    cmd.env("LC_ALL", "C");
    cmd.kill_on_drop(true);

    cmd
}

/// Run a git command, returning its output whatever the exit status.
///
/// The child process is killed if `cancel` fires first.
pub(crate) async fn git_output(
    mut cmd: Command,
    cancel: &CancellationToken,
) -> Result<Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        output = cmd.output() => Ok(output?),
    }
}

/// Format a failed command for error reporting, hiding `secret`
pub(crate) fn describe_command(args: &[&str], secret: Option<&str>) -> String {
    let command = format!("git {}", args.join(" "));
    match secret {
        Some(secret) if !secret.is_empty() => command.replace(secret, "***"),
        _ => command,
    }
}
