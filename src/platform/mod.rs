//! Hosting provider services
//!
//! The cascade engine only needs three things from the provider: where to
//! clone from, which branches the branching model marks for cascading, and a
//! way to open a pull request when a merge step conflicts.

mod bitbucket;

pub use bitbucket::{BitbucketService, DEFAULT_API_URL};

use crate::error::Result;
use crate::types::{CascadeOptions, NewPullRequest, PullRequest, RepoRef};
use async_trait::async_trait;

/// Hosting service trait for repository metadata and PR operations
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Resolve the clone URL of a repository for the given protocol
    /// (e.g. `https`, `ssh`)
    async fn clone_url(&self, repo: &RepoRef, protocol: &str) -> Result<String>;

    /// Fetch the branching model and derive the cascade options
    async fn cascade_options(&self, repo: &RepoRef) -> Result<CascadeOptions>;

    /// Open a pull request
    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest>;
}
