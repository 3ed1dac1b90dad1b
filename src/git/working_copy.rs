//! Working copies backed by the `git` CLI

use super::{
    CommitIdentity, Credentials, MergeStatus, WorkingCopy, WorkspaceProvider, describe_command,
    git_command, git_output,
};
use crate::error::{Error, Result};
use crate::types::RepoRef;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Remote name used for every working copy
const REMOTE: &str = "origin";

/// Hands out git working copies stored under a base directory
#[derive(Debug, Clone)]
pub struct GitWorkspaces {
    base_dir: PathBuf,
    credentials: Option<Credentials>,
    identity: CommitIdentity,
}

impl GitWorkspaces {
    /// Create a provider storing working copies under `base_dir`
    pub fn new(
        base_dir: impl Into<PathBuf>,
        credentials: Option<Credentials>,
        identity: CommitIdentity,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            credentials,
            identity,
        }
    }

    /// Directory holding the working copy of `repo`
    pub fn repo_dir(&self, repo: &RepoRef) -> PathBuf {
        let key = if repo.uuid.is_empty() {
            &repo.name
        } else {
            &repo.uuid
        };
        self.base_dir.join(key.replace(['/', '\\'], "_"))
    }

    /// Embed credentials into HTTP(S) clone URLs.
    ///
    /// Returns the URL to hand to git and the form in which the password
    /// appears in it, for redaction. Non-URL remotes (local paths, scp-like
    /// ssh) are returned unchanged.
    fn authenticated_url(&self, clone_url: &str) -> Result<(String, Option<String>)> {
        let Some(ref credentials) = self.credentials else {
            return Ok((clone_url.to_string(), None));
        };
        let Ok(mut url) = Url::parse(clone_url) else {
            return Ok((clone_url.to_string(), None));
        };
        if !matches!(url.scheme(), "http" | "https") || credentials.username.is_empty() {
            return Ok((clone_url.to_string(), None));
        }

        url.set_username(&credentials.username)
            .map_err(|()| Error::Config(format!("cannot set username on {clone_url}")))?;
        url.set_password(Some(&credentials.password))
            .map_err(|()| Error::Config(format!("cannot set password on {clone_url}")))?;

        let secret = url.password().map(ToString::to_string);
        Ok((url.into(), secret))
    }
}

#[async_trait]
impl WorkspaceProvider for GitWorkspaces {
    async fn open(
        &self,
        repo: &RepoRef,
        clone_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn WorkingCopy>> {
        let path = self.repo_dir(repo);
        let (remote_url, secret) = self.authenticated_url(clone_url)?;
        let working_copy = GitWorkingCopy {
            path,
            identity: self.identity.clone(),
            secret,
        };

        if working_copy.path.join(".git").exists() {
            debug!(repo = %repo, path = %working_copy.path.display(), "refreshing working copy");
            working_copy
                .run(&["remote", "set-url", REMOTE, &remote_url], cancel)
                .await?;
            working_copy.run(&["reset", "--hard"], cancel).await?;
            working_copy
                .run(&["fetch", "--prune", REMOTE], cancel)
                .await?;
        } else {
            if working_copy.path.exists() {
                // leftover of an interrupted clone
                tokio::fs::remove_dir_all(&working_copy.path).await?;
            }
            tokio::fs::create_dir_all(&self.base_dir).await?;
            info!(repo = %repo, path = %working_copy.path.display(), "cloning repository");

            let target = working_copy
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Config(format!("invalid working copy path for {repo}")))?;
            let args = ["clone", "--origin", REMOTE, remote_url.as_str(), target.as_str()];
            let output = git_output(
                {
                    let mut cmd = git_command(&self.base_dir);
                    cmd.args(args);
                    cmd
                },
                cancel,
            )
            .await?;
            working_copy.check(&args, output)?;
        }

        Ok(Box::new(working_copy))
    }
}

/// A git working copy on local disk
#[derive(Debug)]
pub struct GitWorkingCopy {
    path: PathBuf,
    identity: CommitIdentity,
    secret: Option<String>,
}

impl GitWorkingCopy {
    fn command(&self, args: &[&str], with_identity: bool) -> tokio::process::Command {
        let mut cmd = git_command(&self.path);
        if with_identity {
            cmd.arg("-c");
            cmd.arg(format!("user.name={}", self.identity.name));
            cmd.arg("-c");
            cmd.arg(format!("user.email={}", self.identity.email));
        }
        cmd.args(args);
        cmd
    }

    fn failure(&self, args: &[&str], output: &Output) -> Error {
        Error::Git {
            command: describe_command(args, self.secret.as_deref()),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    fn check(&self, args: &[&str], output: Output) -> Result<Output> {
        if output.status.success() {
            Ok(output)
        } else {
            Err(self.failure(args, &output))
        }
    }

    async fn run(&self, args: &[&str], cancel: &CancellationToken) -> Result<Output> {
        let output = git_output(self.command(args, false), cancel).await?;
        self.check(args, output)
    }

    async fn run_stdout(&self, args: &[&str], cancel: &CancellationToken) -> Result<String> {
        let output = self.run(args, cancel).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn unmerged_files(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let stdout = self
            .run_stdout(&["diff", "--name-only", "--diff-filter=U"], cancel)
            .await?;
        Ok(stdout.lines().map(ToString::to_string).collect())
    }
}

#[async_trait]
impl WorkingCopy for GitWorkingCopy {
    async fn list_branches(&self) -> Result<Vec<String>> {
        let prefix = format!("refs/remotes/{REMOTE}");
        let stdout = self
            .run_stdout(
                &["for-each-ref", "--format=%(refname:lstrip=3)", &prefix],
                &CancellationToken::new(),
            )
            .await?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "HEAD")
            .map(ToString::to_string)
            .collect())
    }

    async fn merge_branch(
        &self,
        current: &str,
        next: &str,
        cancel: &CancellationToken,
    ) -> Result<MergeStatus> {
        debug!(current, next, "merging");
        let next_remote = format!("refs/remotes/{REMOTE}/{next}");
        let current_remote = format!("refs/remotes/{REMOTE}/{current}");

        self.run(&["checkout", "-f", "-B", next, &next_remote], cancel)
            .await?;

        let message = format!("Merge branch '{current}' into {next}");
        let merge_args = [
            "merge",
            "--no-ff",
            "--no-edit",
            "-m",
            message.as_str(),
            current_remote.as_str(),
        ];
        let output = git_output(self.command(&merge_args, true), cancel).await?;

        if !output.status.success() {
            let conflicting_files = self.unmerged_files(cancel).await?;
            if conflicting_files.is_empty() {
                return Err(self.failure(&merge_args, &output));
            }
            self.run(&["merge", "--abort"], cancel).await?;
            info!(current, next, files = conflicting_files.len(), "merge conflict");
            return Ok(MergeStatus::Conflict { conflicting_files });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("Already up to date") {
            debug!(current, next, "already up to date");
            return Ok(MergeStatus::UpToDate);
        }

        let refspec = format!("HEAD:refs/heads/{next}");
        self.run(&["push", REMOTE, &refspec], cancel).await?;
        // keep the tracking ref current so the next step merges what we pushed
        self.run(&["update-ref", &next_remote, "HEAD"], cancel)
            .await?;

        info!(current, next, "merged and pushed");
        Ok(MergeStatus::Merged)
    }
}
