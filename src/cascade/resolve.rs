//! Cascade resolution - pure functions, no I/O
//!
//! A [`Cascade`] is the ordered list of branches a merged change has to
//! travel through: every release branch newer than the one it landed in,
//! then the development branch.

use super::version::{VersionKey, extract_version};
use crate::error::{Error, Result};
use crate::types::CascadeOptions;

/// Ordered, duplicate-free sequence of branches with a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    branches: Vec<String>,
    current: usize,
    development: Option<String>,
}

impl Cascade {
    /// Create an empty cascade
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cascade whose development branch sorts last
    /// regardless of its name
    pub fn with_development_branch(name: impl Into<String>) -> Self {
        Self {
            development: Some(name.into()),
            ..Self::default()
        }
    }

    /// Resolve the cascade for a repository's branches.
    ///
    /// Keeps release branches (by prefix) that carry a version, plus the
    /// development branch when present, ordered by ascending version with
    /// the development branch last.
    pub fn build<I, S>(branches: I, options: &CascadeOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cascade = Self::with_development_branch(&options.development_branch);
        let mut has_development = false;

        for branch in branches {
            let branch = branch.as_ref();
            if branch == options.development_branch {
                has_development = true;
            } else if branch.starts_with(&options.release_prefix) {
                cascade.append_semver(branch);
            }
        }

        if has_development {
            cascade.append(&options.development_branch);
            cascade.sort();
        }

        cascade
    }

    /// Ordering key of a branch within this cascade
    fn key(&self, branch: &str) -> VersionKey {
        if self.development.as_deref() == Some(branch) {
            VersionKey::Max
        } else {
            extract_version(branch)
        }
    }

    fn sort(&mut self) {
        let mut branches = std::mem::take(&mut self.branches);
        branches.sort_by_key(|b| self.key(b));
        self.branches = branches;
    }

    /// Append a branch as-is. No-op if already present.
    pub fn append(&mut self, branch: &str) {
        if self.contains(branch) {
            return;
        }
        self.branches.push(branch.to_string());
    }

    /// Append a branch and keep the cascade sorted by version.
    ///
    /// No-op if already present. Branches without version information are
    /// not added.
    pub fn append_semver(&mut self, branch: &str) {
        if self.contains(branch) || self.key(branch).is_zero() {
            return;
        }
        self.branches.push(branch.to_string());
        self.sort();
    }

    /// Keep only `start` and the branches following it, resetting the
    /// cursor onto `start`.
    ///
    /// Fails without modifying the cascade if `start` is absent.
    pub fn slice_from(&mut self, start: &str) -> Result<()> {
        let position = self
            .branches
            .iter()
            .position(|b| b == start)
            .ok_or_else(|| Error::BranchNotInCascade(start.to_string()))?;
        self.branches.drain(..position);
        self.current = 0;
        Ok(())
    }

    /// Advance the cursor and return the branch it now points at.
    ///
    /// Returns `None` once the last branch is reached, and keeps doing so on
    /// further calls.
    pub fn next_branch(&mut self) -> Option<&str> {
        if self.current + 1 < self.branches.len() {
            self.current += 1;
            Some(&self.branches[self.current])
        } else {
            None
        }
    }

    /// Branch under the cursor
    pub fn current(&self) -> Option<&str> {
        self.branches.get(self.current).map(String::as_str)
    }

    /// All branches in cascade order
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// Whether the cascade contains `branch`
    pub fn contains(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }
}

impl std::fmt::Display for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.branches.join(" -> "))
    }
}
