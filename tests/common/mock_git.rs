//! Mock working copies for testing the orchestrator without git

#![allow(dead_code)]

use async_trait::async_trait;
use cascade_merge::error::{Error, Result};
use cascade_merge::git::{MergeStatus, WorkingCopy, WorkspaceProvider};
use cascade_merge::types::RepoRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Call record for `merge_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub current: String,
    pub next: String,
}

#[derive(Default)]
struct State {
    branches: Vec<String>,
    // (current, next) -> scripted result; anything else merges cleanly
    responses: HashMap<(String, String), MergeResponse>,
    merge_calls: Vec<MergeCall>,
    open_calls: Vec<(String, String)>,
    error_on_open: Option<String>,
    error_on_list: Option<String>,
}

#[derive(Clone)]
enum MergeResponse {
    Status(MergeStatus),
    Fail(String),
}

/// Mock provider handing out one shared scripted working copy
///
/// Clones share state, so a test can keep a handle for inspection after
/// passing one to the orchestrator.
#[derive(Clone, Default)]
pub struct MockWorkspaces {
    state: Arc<Mutex<State>>,
}

impl MockWorkspaces {
    /// Create a provider whose working copy lists `branches`
    pub fn with_branches(branches: &[&str]) -> Self {
        let workspaces = Self::default();
        workspaces.state.lock().unwrap().branches =
            branches.iter().map(ToString::to_string).collect();
        workspaces
    }

    /// Make merging `current` into `next` conflict
    pub fn conflict_on(&self, current: &str, next: &str) {
        self.respond(
            current,
            next,
            MergeResponse::Status(MergeStatus::Conflict {
                conflicting_files: vec!["README.md".to_string()],
            }),
        );
    }

    /// Make merging `current` into `next` report nothing to do
    pub fn up_to_date_on(&self, current: &str, next: &str) {
        self.respond(current, next, MergeResponse::Status(MergeStatus::UpToDate));
    }

    /// Make merging `current` into `next` fail with a git error
    pub fn fail_merge_on(&self, current: &str, next: &str, msg: &str) {
        self.respond(current, next, MergeResponse::Fail(msg.to_string()));
    }

    /// Make `open` return an error
    pub fn fail_open(&self, msg: &str) {
        self.state.lock().unwrap().error_on_open = Some(msg.to_string());
    }

    /// Make `list_branches` return an error
    pub fn fail_list_branches(&self, msg: &str) {
        self.state.lock().unwrap().error_on_list = Some(msg.to_string());
    }

    fn respond(&self, current: &str, next: &str, response: MergeResponse) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((current.to_string(), next.to_string()), response);
    }

    pub fn get_merge_calls(&self) -> Vec<MergeCall> {
        self.state.lock().unwrap().merge_calls.clone()
    }

    /// (repo name, clone URL) per `open` call
    pub fn get_open_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().open_calls.clone()
    }

    /// Merged pairs as `current -> next` strings
    pub fn merged_pairs(&self) -> Vec<String> {
        self.get_merge_calls()
            .into_iter()
            .map(|c| format!("{} -> {}", c.current, c.next))
            .collect()
    }
}

#[async_trait]
impl WorkspaceProvider for MockWorkspaces {
    async fn open(
        &self,
        repo: &RepoRef,
        clone_url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn WorkingCopy>> {
        let mut state = self.state.lock().unwrap();
        state
            .open_calls
            .push((repo.name.clone(), clone_url.to_string()));

        if let Some(msg) = state.error_on_open.as_ref() {
            return Err(Error::Git {
                command: "git clone".to_string(),
                stderr: msg.clone(),
            });
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl WorkingCopy for MockWorkspaces {
    async fn list_branches(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if let Some(msg) = state.error_on_list.as_ref() {
            return Err(Error::Git {
                command: "git for-each-ref".to_string(),
                stderr: msg.clone(),
            });
        }
        Ok(state.branches.clone())
    }

    async fn merge_branch(
        &self,
        current: &str,
        next: &str,
        _cancel: &CancellationToken,
    ) -> Result<MergeStatus> {
        let mut state = self.state.lock().unwrap();
        state.merge_calls.push(MergeCall {
            current: current.to_string(),
            next: next.to_string(),
        });

        match state
            .responses
            .get(&(current.to_string(), next.to_string()))
            .cloned()
        {
            Some(MergeResponse::Status(status)) => Ok(status),
            Some(MergeResponse::Fail(msg)) => Err(Error::Git {
                command: format!("git merge {current}"),
                stderr: msg,
            }),
            None => Ok(MergeStatus::Merged),
        }
    }
}
