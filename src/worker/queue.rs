//! Bounded ingestion queue between webhook handlers and the cascade worker

use crate::types::MergeEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Number of events buffered before webhooks are rejected
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Why an event was not enqueued
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is at capacity
    #[error("queue is full")]
    Full,
    /// The worker has stopped
    #[error("queue is closed")]
    Closed,
}

/// Producer side of the ingestion queue.
///
/// Cheap to clone; every webhook handler holds one. Enqueueing never
/// blocks: a full queue rejects the event.
#[derive(Debug, Clone)]
pub struct IngestionQueue {
    sender: mpsc::Sender<MergeEvent>,
}

impl IngestionQueue {
    /// Create a queue holding at most `capacity` events, returning the
    /// producer handle and the receiver for the single consumer
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<MergeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting
    pub fn try_enqueue(&self, event: MergeEvent) -> Result<(), EnqueueError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Number of events waiting to be processed
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Whether no events are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered events
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}
