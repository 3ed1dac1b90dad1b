//! Shared test fixtures

#![allow(dead_code)]

mod mock_git;
mod mock_hosting;

pub use mock_git::{MergeCall, MockWorkspaces};
pub use mock_hosting::{CreatePullRequestCall, MockHostingService};

use cascade_merge::types::{CascadeOptions, MergeEvent, RepoRef};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Branching model used across tests: `devel` plus `release/` branches
pub fn default_options() -> CascadeOptions {
    CascadeOptions {
        development_branch: "devel".to_string(),
        release_prefix: "release/".to_string(),
    }
}

pub fn winterfell() -> RepoRef {
    RepoRef {
        uuid: "{7c3f2a1e-0000-4000-8000-000000000001}".to_string(),
        name: "winterfell".to_string(),
        owner: "{the-north}".to_string(),
    }
}

pub fn merge_event(source: &str, destination: &str) -> MergeEvent {
    MergeEvent {
        repository: winterfell(),
        source_branch: source.to_string(),
        destination_branch: destination.to_string(),
    }
}

/// Bitbucket `pullrequest:fulfilled` style payload
pub fn webhook_payload(state: &str, source: &str, destination: &str) -> serde_json::Value {
    json!({
        "actor": { "uuid": "{ned}" },
        "repository": {
            "uuid": "{7c3f2a1e-0000-4000-8000-000000000001}",
            "name": "winterfell",
            "owner": { "uuid": "{the-north}" },
            "links": {
                "self": { "href": "https://api.bitbucket.org/2.0/repositories/the-north/winterfell" }
            }
        },
        "pullrequest": {
            "id": 42,
            "title": "Fix the wall",
            "state": state,
            "source": { "branch": { "name": source } },
            "destination": { "branch": { "name": destination } }
        }
    })
}

/// A bare origin repository plus a seeding clone, for tests driving real git
pub struct TempGitOrigin {
    pub dir: TempDir,
    pub origin: PathBuf,
    pub seed: PathBuf,
}

impl TempGitOrigin {
    /// Create an origin whose `base` branch holds a single README commit
    pub fn new(base: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let origin = dir.path().join("origin.git");
        let seed = dir.path().join("seed");

        git(dir.path(), &["init", "--bare", "origin.git"]);
        git(dir.path(), &["init", "seed"]);
        git(&seed, &["checkout", "-b", base]);
        std::fs::write(seed.join("README.md"), "winter is coming\n").unwrap();
        git(&seed, &["add", "README.md"]);
        git(&seed, &["commit", "-m", "initial"]);
        git(
            &seed,
            &["remote", "add", "origin", origin.to_str().unwrap()],
        );
        git(&seed, &["push", "origin", base]);
        git(&origin, &["symbolic-ref", "HEAD", &format!("refs/heads/{base}")]);

        Self { dir, origin, seed }
    }

    /// Clone URL for the origin
    pub fn url(&self) -> String {
        self.origin.to_string_lossy().into_owned()
    }

    /// Create `branch` from `from` and push it
    pub fn branch(&self, branch: &str, from: &str) {
        git(&self.seed, &["checkout", from]);
        git(&self.seed, &["checkout", "-b", branch]);
        git(&self.seed, &["push", "origin", branch]);
    }

    /// Commit `content` to `file` on `branch` and push it
    pub fn commit(&self, branch: &str, file: &str, content: &str) {
        git(&self.seed, &["checkout", branch]);
        std::fs::write(self.seed.join(file), content).unwrap();
        git(&self.seed, &["add", file]);
        git(&self.seed, &["commit", "-m", &format!("update {file} on {branch}")]);
        git(&self.seed, &["push", "origin", branch]);
    }

    /// Contents of `file` at the tip of `branch` in the origin
    pub fn show(&self, branch: &str, file: &str) -> String {
        git_stdout(&self.origin, &["show", &format!("{branch}:{file}")])
    }

    /// Subject of the latest commit on `branch` in the origin
    pub fn head_subject(&self, branch: &str) -> String {
        git_stdout(&self.origin, &["log", "-1", "--format=%s", branch])
            .trim()
            .to_string()
    }
}

fn git_cmd(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "init.defaultBranch=main"])
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd
}

fn git(dir: &Path, args: &[&str]) {
    let output = git_cmd(dir, args).output().expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = git_cmd(dir, args).output().expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
