//! Event ingestion and the cascade worker
//!
//! Webhook handlers push accepted events into a bounded [`IngestionQueue`];
//! exactly one [`CascadeWorker`] drains it in FIFO order. A full queue
//! rejects new events instead of blocking (backpressure).

mod consumer;
mod queue;

pub use consumer::CascadeWorker;
pub use queue::{DEFAULT_QUEUE_CAPACITY, EnqueueError, IngestionQueue};
