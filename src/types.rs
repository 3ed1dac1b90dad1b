//! Core types for cascade-merge

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Webhook payload (Bitbucket `pullrequest:fulfilled`)
// =============================================================================

/// A pull request webhook delivery
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Repository the pull request belongs to
    pub repository: Option<Repository>,
    /// User that triggered the event
    #[serde(default)]
    pub actor: Option<User>,
    /// The pull request itself
    #[serde(rename = "pullrequest", alias = "pullRequest", alias = "PullRequest")]
    pub pull_request: Option<PullRequestPayload>,
}

/// Pull request section of a webhook payload
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    /// Pull request id
    #[serde(default)]
    pub id: u64,
    /// Pull request title
    #[serde(default)]
    pub title: String,
    /// Pull request state; absent or null when the sender omits it
    #[serde(default)]
    pub state: Option<PrState>,
    /// Source branch reference
    pub source: Option<PullRequestRef>,
    /// Destination branch reference
    pub destination: Option<PullRequestRef>,
}

/// State of a pull request as reported by Bitbucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was merged
    Merged,
    /// PR was declined
    Declined,
    /// PR was superseded by another
    Superseded,
    /// Any state this crate does not know about
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
            Self::Declined => write!(f, "DECLINED"),
            Self::Superseded => write!(f, "SUPERSEDED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Source or destination of a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    /// Branch of the reference
    pub branch: Option<BranchRef>,
}

impl PullRequestRef {
    /// Branch name, if the reference carries one
    pub fn branch_name(&self) -> Option<&str> {
        self.branch.as_ref().map(|b| b.name.as_str())
    }
}

/// A branch name wrapper as found in Bitbucket payloads
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    /// Branch name
    pub name: String,
}

/// A Bitbucket repository
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    /// Repository UUID (including braces)
    #[serde(default)]
    pub uuid: String,
    /// Repository slug/name
    #[serde(default)]
    pub name: String,
    /// Repository links
    #[serde(default)]
    pub links: Links,
    /// Repository owner
    pub owner: Option<User>,
}

/// Links attached to a repository
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    /// API self link
    #[serde(rename = "self")]
    pub self_link: Option<Link>,
    /// Clone links, one per protocol
    pub clone: Option<Vec<Link>>,
}

/// A named hyperlink
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    /// Link name (for clone links: the protocol)
    #[serde(default)]
    pub name: String,
    /// Target URL
    pub href: String,
}

/// A Bitbucket user or team
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    /// Account UUID
    #[serde(default)]
    pub uuid: String,
}

impl Repository {
    /// Find the clone URL for the first matching protocol.
    ///
    /// An empty protocol matches any link, so `clone_url(&[""])` returns
    /// the first clone link available.
    pub fn clone_url(&self, protocols: &[&str]) -> Result<String> {
        let links = self.links.clone.as_ref().ok_or(Error::MissingCloneLink)?;

        links
            .iter()
            .find(|link| {
                protocols
                    .iter()
                    .any(|p| p.is_empty() || *p == link.name)
            })
            .map(|link| link.href.clone())
            .ok_or(Error::NoMatchingCloneLink)
    }
}

// =============================================================================
// Cascade domain types
// =============================================================================

/// Identifies a repository on the hosting provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Repository UUID, used to key the local working copy
    pub uuid: String,
    /// Repository slug
    pub name: String,
    /// Owner (workspace) UUID
    pub owner: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An accepted merge event, ready for the cascade worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEvent {
    /// Repository the merge happened in
    pub repository: RepoRef,
    /// Branch that was merged
    pub source_branch: String,
    /// Branch the pull request landed in
    pub destination_branch: String,
}

/// Reasons a webhook payload cannot become a [`MergeEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRejection {
    /// `pullrequest` is absent
    MissingPullRequest,
    /// The pull request is not merged
    NotMerged(PrState),
    /// A required field is absent
    MissingField(&'static str),
}

impl MergeEvent {
    /// Build a merge event from a decoded webhook payload.
    ///
    /// Only merged pull requests are accepted.
    pub fn from_webhook(event: &PullRequestEvent) -> std::result::Result<Self, EventRejection> {
        let pr = event
            .pull_request
            .as_ref()
            .ok_or(EventRejection::MissingPullRequest)?;

        let state = pr.state.clone().unwrap_or(PrState::Unknown);
        if state != PrState::Merged {
            return Err(EventRejection::NotMerged(state));
        }

        let repository = event
            .repository
            .as_ref()
            .ok_or(EventRejection::MissingField("repository"))?;
        let owner = repository
            .owner
            .as_ref()
            .ok_or(EventRejection::MissingField("repository.owner"))?;
        let source_branch = pr
            .source
            .as_ref()
            .and_then(PullRequestRef::branch_name)
            .ok_or(EventRejection::MissingField("pullrequest.source.branch"))?;
        let destination_branch = pr
            .destination
            .as_ref()
            .and_then(PullRequestRef::branch_name)
            .ok_or(EventRejection::MissingField("pullrequest.destination.branch"))?;

        Ok(Self {
            repository: RepoRef {
                uuid: repository.uuid.clone(),
                name: repository.name.clone(),
                owner: owner.uuid.clone(),
            },
            source_branch: source_branch.to_string(),
            destination_branch: destination_branch.to_string(),
        })
    }
}

/// Branching model settings that drive cascade resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOptions {
    /// Name of the development branch (the cascade tip)
    pub development_branch: String,
    /// Prefix identifying release branches
    pub release_prefix: String,
}

impl CascadeOptions {
    /// Whether a destination branch takes part in cascading.
    ///
    /// A branch on the development line that is not also a release branch
    /// is already the tip, so there is nothing to cascade.
    pub fn is_cascade_candidate(&self, destination: &str) -> bool {
        !(destination.starts_with(&self.development_branch)
            && !destination.starts_with(&self.release_prefix))
    }
}

/// A pull request created on the hosting provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR id
    pub id: u64,
    /// PR title
    pub title: String,
    /// Source branch name
    pub source: String,
    /// Destination branch name
    pub destination: String,
    /// Web URL for the PR, if reported
    pub html_url: Option<String>,
}

/// Request to open a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// PR title
    pub title: String,
    /// PR description
    pub description: String,
    /// Branch to merge from
    pub source: String,
    /// Branch to merge into
    pub destination: String,
}
