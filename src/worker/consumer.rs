//! The single cascade worker
//!
//! Dequeues merge events one at a time and runs each to completion
//! (including every git and API call) before taking the next. This is what
//! keeps the per-repository working copies free of concurrent access.

use crate::merge::{MergeOrchestrator, MergeOutcome, open_recovery_pull_request};
use crate::types::MergeEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Consumer side of the ingestion queue
pub struct CascadeWorker {
    receiver: mpsc::Receiver<MergeEvent>,
    orchestrator: MergeOrchestrator,
    shutdown: CancellationToken,
}

impl CascadeWorker {
    /// Create a worker draining `receiver`
    pub fn new(receiver: mpsc::Receiver<MergeEvent>, orchestrator: MergeOrchestrator) -> Self {
        Self {
            receiver,
            orchestrator,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop the worker loop when `shutdown` fires
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Spawn the worker loop onto the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process events until the queue closes or shutdown is requested
    pub async fn run(mut self) {
        loop {
            let event = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                event = self.receiver.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            self.handle(&event).await;
        }
        info!("cascade worker stopped");
    }

    /// Run one event and act on its outcome
    pub async fn handle(&self, event: &MergeEvent) -> MergeOutcome {
        let repo = &event.repository;
        info!(
            repo = %repo,
            source = %event.source_branch,
            destination = %event.destination_branch,
            "processing cascade merge"
        );

        let outcome = self.orchestrator.process(event).await;
        match &outcome {
            MergeOutcome::Done => {
                info!(repo = %repo, destination = %event.destination_branch, "cascade complete");
            }
            MergeOutcome::Conflict { source, target } => {
                // never retried; the event ends here either way
                if let Err(e) = open_recovery_pull_request(
                    self.orchestrator.hosting(),
                    repo,
                    source,
                    target,
                )
                .await
                {
                    error!(
                        repo = %repo,
                        source = %source,
                        target = %target,
                        error = %e,
                        "could not create a pull request"
                    );
                }
            }
            MergeOutcome::Failed { cause } => {
                error!(repo = %repo, error = %cause, "error while doing cascade merge");
            }
        }
        outcome
    }
}
