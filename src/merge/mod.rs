//! Merge engine for release cascades
//!
//! Three phases:
//! 1. Resolve - branching model, working copy, branch list (effectful)
//! 2. Plan - build the `Cascade` (pure, see `crate::cascade`)
//! 3. Walk - merge pair by pair, recover on conflict (effectful)

mod orchestrate;
mod recovery;

pub use orchestrate::{MergeOrchestrator, MergeOutcome};
pub use recovery::{
    RECOVERY_DESCRIPTION, RECOVERY_TITLE, open_recovery_pull_request, recovery_request,
};
