//! Conflict recovery
//!
//! When a cascade step conflicts, a pull request between the two branches
//! is opened so the merge can be finished by hand.

use crate::error::Result;
use crate::platform::HostingService;
use crate::types::{NewPullRequest, PullRequest, RepoRef};
use tracing::info;

/// Title of recovery pull requests
pub const RECOVERY_TITLE: &str = "Automatic merge failure";

/// Description of recovery pull requests
pub const RECOVERY_DESCRIPTION: &str =
    "There was a merge conflict automatically merging this branch";

/// Pull request asking for `source` to be merged into `target`
pub fn recovery_request(source: &str, target: &str) -> NewPullRequest {
    NewPullRequest {
        title: RECOVERY_TITLE.to_string(),
        description: RECOVERY_DESCRIPTION.to_string(),
        source: source.to_string(),
        destination: target.to_string(),
    }
}

/// Open the recovery pull request for a conflicting pair
pub async fn open_recovery_pull_request(
    hosting: &dyn HostingService,
    repo: &RepoRef,
    source: &str,
    target: &str,
) -> Result<PullRequest> {
    let request = recovery_request(source, target);
    let pr = hosting.create_pull_request(repo, &request).await?;
    info!(repo = %repo, source, target, pr_id = pr.id, "pull request created");
    Ok(pr)
}
