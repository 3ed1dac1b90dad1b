//! Mock hosting service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use cascade_merge::error::{Error, Result};
use cascade_merge::platform::HostingService;
use cascade_merge::types::{CascadeOptions, NewPullRequest, PullRequest, RepoRef};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequestCall {
    pub repo: String,
    pub request: NewPullRequest,
}

/// Simple mock hosting service for testing
///
/// Features:
/// - Auto-incrementing PR ids
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockHostingService {
    options: CascadeOptions,
    clone_url: String,
    next_pr_id: AtomicU64,
    // Call tracking
    clone_url_calls: Mutex<Vec<String>>,
    cascade_options_calls: Mutex<Vec<String>>,
    create_pull_request_calls: Mutex<Vec<CreatePullRequestCall>>,
    // Error injection
    error_on_clone_url: Mutex<Option<String>>,
    error_on_cascade_options: Mutex<Option<String>>,
    error_on_create_pull_request: Mutex<Option<String>>,
}

impl MockHostingService {
    /// Create a mock reporting `options` as the branching model
    pub fn with_options(options: CascadeOptions) -> Self {
        Self {
            options,
            clone_url: "https://bitbucket.org/the-north/winterfell.git".to_string(),
            next_pr_id: AtomicU64::new(1),
            clone_url_calls: Mutex::new(Vec::new()),
            cascade_options_calls: Mutex::new(Vec::new()),
            create_pull_request_calls: Mutex::new(Vec::new()),
            error_on_clone_url: Mutex::new(None),
            error_on_cascade_options: Mutex::new(None),
            error_on_create_pull_request: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `clone_url` return an error
    pub fn fail_clone_url(&self, msg: &str) {
        *self.error_on_clone_url.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `cascade_options` return an error
    pub fn fail_cascade_options(&self, msg: &str) {
        *self.error_on_cascade_options.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pull_request` return an error
    pub fn fail_create_pull_request(&self, msg: &str) {
        *self.error_on_create_pull_request.lock().unwrap() = Some(msg.to_string());
    }

    // === Call inspection ===

    pub fn get_clone_url_calls(&self) -> Vec<String> {
        self.clone_url_calls.lock().unwrap().clone()
    }

    pub fn get_cascade_options_calls(&self) -> Vec<String> {
        self.cascade_options_calls.lock().unwrap().clone()
    }

    pub fn get_create_pull_request_calls(&self) -> Vec<CreatePullRequestCall> {
        self.create_pull_request_calls.lock().unwrap().clone()
    }

    /// Assert exactly one recovery pull request from `source` into `target`
    pub fn assert_single_pull_request(&self, source: &str, target: &str) {
        let calls = self.get_create_pull_request_calls();
        assert_eq!(calls.len(), 1, "expected one pull request, got {calls:?}");
        assert_eq!(calls[0].request.source, source);
        assert_eq!(calls[0].request.destination, target);
    }
}

#[async_trait]
impl HostingService for MockHostingService {
    async fn clone_url(&self, repo: &RepoRef, _protocol: &str) -> Result<String> {
        self.clone_url_calls.lock().unwrap().push(repo.name.clone());

        if let Some(msg) = self.error_on_clone_url.lock().unwrap().as_ref() {
            return Err(Error::Bitbucket(msg.clone()));
        }
        Ok(self.clone_url.clone())
    }

    async fn cascade_options(&self, repo: &RepoRef) -> Result<CascadeOptions> {
        self.cascade_options_calls
            .lock()
            .unwrap()
            .push(repo.name.clone());

        if let Some(msg) = self.error_on_cascade_options.lock().unwrap().as_ref() {
            return Err(Error::Bitbucket(msg.clone()));
        }
        Ok(self.options.clone())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest> {
        self.create_pull_request_calls
            .lock()
            .unwrap()
            .push(CreatePullRequestCall {
                repo: repo.name.clone(),
                request: request.clone(),
            });

        if let Some(msg) = self.error_on_create_pull_request.lock().unwrap().as_ref() {
            return Err(Error::Bitbucket(msg.clone()));
        }

        let id = self.next_pr_id.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            id,
            title: request.title.clone(),
            source: request.source.clone(),
            destination: request.destination.clone(),
            html_url: Some(format!(
                "https://bitbucket.org/the-north/{}/pull-requests/{id}",
                repo.name
            )),
        })
    }
}
