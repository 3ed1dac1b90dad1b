//! Cascade resolution
//!
//! Pure logic turning a repository's branch list and branching model into
//! the ordered sequence of branches a merge has to travel through.

mod resolve;
mod version;

pub use resolve::Cascade;
pub use version::{
    DEVELOPMENT_TOKEN, Version, VersionKey, extract_version, parse_branch_version,
    sort_by_version,
};
