//! Merge orchestration - effectful cascade walk
//!
//! Resolves the cascade for a merge event (branching model, clone, branch
//! list) and walks it pair by pair, stopping at the first conflict or
//! infrastructure failure.

use crate::cascade::Cascade;
use crate::error::{Error, Result};
use crate::git::{MergeStatus, WorkingCopy, WorkspaceProvider};
use crate::platform::HostingService;
use crate::types::MergeEvent;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Final state of one merge event
#[derive(Debug)]
pub enum MergeOutcome {
    /// Nothing (left) to merge
    Done,
    /// Merging `source` into `target` needs a human
    Conflict {
        /// Branch that could not be merged
        source: String,
        /// Branch it could not be merged into
        target: String,
    },
    /// An infrastructure or API error aborted the walk
    Failed {
        /// What went wrong
        cause: Error,
    },
}

impl MergeOutcome {
    /// Returns true for the conflict outcome
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done => write!(f, "done"),
            Self::Conflict { source, target } => write!(f, "conflict merging {source} into {target}"),
            Self::Failed { cause } => write!(f, "failed: {cause}"),
        }
    }
}

/// Walks cascades for merge events
pub struct MergeOrchestrator {
    hosting: Arc<dyn HostingService>,
    workspaces: Arc<dyn WorkspaceProvider>,
    clone_protocol: String,
    cancel: CancellationToken,
}

impl MergeOrchestrator {
    /// Create an orchestrator. Git operations run without a deadline unless
    /// a token is supplied through [`with_cancellation`](Self::with_cancellation).
    pub fn new(
        hosting: Arc<dyn HostingService>,
        workspaces: Arc<dyn WorkspaceProvider>,
        clone_protocol: impl Into<String>,
    ) -> Self {
        Self {
            hosting,
            workspaces,
            clone_protocol: clone_protocol.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to interrupt in-flight git operations
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Hosting service used for lookups and recovery pull requests
    pub fn hosting(&self) -> &dyn HostingService {
        self.hosting.as_ref()
    }

    /// Process one merge event end to end
    pub async fn process(&self, event: &MergeEvent) -> MergeOutcome {
        match self.resolve(event).await {
            Ok(Some((cascade, working_copy))) => self.walk(cascade, working_copy.as_ref()).await,
            Ok(None) => MergeOutcome::Done,
            Err(cause) => MergeOutcome::Failed { cause },
        }
    }

    /// Build the cascade starting at the event's destination branch.
    ///
    /// Returns `None` when the destination does not take part in cascading.
    async fn resolve(
        &self,
        event: &MergeEvent,
    ) -> Result<Option<(Cascade, Box<dyn WorkingCopy>)>> {
        let repo = &event.repository;
        let destination = event.destination_branch.as_str();

        let options = self.hosting.cascade_options(repo).await?;
        if !options.is_cascade_candidate(destination) {
            debug!(repo = %repo, destination, "destination is the development tip, skipping");
            return Ok(None);
        }

        let clone_url = self.hosting.clone_url(repo, &self.clone_protocol).await?;
        let working_copy = self.workspaces.open(repo, &clone_url, &self.cancel).await?;
        let branches = working_copy.list_branches().await?;

        let mut cascade = Cascade::build(&branches, &options);
        if !cascade.contains(destination) {
            info!(repo = %repo, destination, "destination is not a cascade branch, skipping");
            return Ok(None);
        }
        cascade.slice_from(destination)?;

        info!(repo = %repo, cascade = %cascade, "resolved cascade");
        Ok(Some((cascade, working_copy)))
    }

    /// Merge each branch of the cascade into the following one
    pub async fn walk(&self, mut cascade: Cascade, working_copy: &dyn WorkingCopy) -> MergeOutcome {
        let Some(mut current) = cascade.current().map(ToString::to_string) else {
            return MergeOutcome::Done;
        };

        while let Some(next) = cascade.next_branch().map(ToString::to_string) {
            match working_copy
                .merge_branch(&current, &next, &self.cancel)
                .await
            {
                Ok(MergeStatus::Merged | MergeStatus::UpToDate) => {
                    debug!(source = %current, target = %next, "cascade step complete");
                    current = next;
                }
                Ok(MergeStatus::Conflict { conflicting_files }) => {
                    warn!(
                        source = %current,
                        target = %next,
                        files = ?conflicting_files,
                        "cascade stopped on conflict"
                    );
                    return MergeOutcome::Conflict {
                        source: current,
                        target: next,
                    };
                }
                Err(cause) => {
                    warn!(source = %current, target = %next, error = %cause, "cascade step failed");
                    return MergeOutcome::Failed { cause };
                }
            }
        }

        MergeOutcome::Done
    }
}
