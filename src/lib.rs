//! cascade-merge - cascading merges across release branches
//!
//! When a pull request lands in a release branch, the change is merged
//! forward into every newer release branch and finally into the
//! development branch. The first conflict stops the walk and opens a pull
//! request for a human to resolve.
//!
//! # Layout
//!
//! - [`server`] accepts Bitbucket webhooks and queues merge events
//! - [`worker`] drains the queue with a single consumer
//! - [`merge`] resolves and walks the cascade for one event
//! - [`cascade`] orders branches by version
//! - [`platform`] talks to the Bitbucket REST API
//! - [`git`] manages local working copies

pub mod cascade;
pub mod config;
pub mod error;
pub mod git;
pub mod merge;
pub mod platform;
pub mod server;
pub mod types;
pub mod worker;

pub use error::{Error, Result};
