//! Version keys extracted from branch names
//!
//! Release branches carry their version in the last path segment
//! (`release/22.1.1`, `release/v22.1.1`, `release/version_22.1.1`). The
//! development branch has no version but must sort after every release, and
//! anything else sorts first.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Literal branch name that always sorts as the newest version
pub const DEVELOPMENT_TOKEN: &str = "devel";

/// Token stripped from the version segment of a branch name
const VERSION_TOKEN: &str = "version_";

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+(?:\.\d+)*)(?:-([0-9A-Za-z.~-]+))?(?:\+([0-9A-Za-z.~-]+))?$")
        .expect("valid semver pattern")
});

/// A parsed semantic version.
///
/// Missing trailing components compare as zero, so `2` == `2.0` == `2.0.0`.
/// A pre-release sorts before the matching release; build metadata is
/// ignored for ordering.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    pre: Option<String>,
}

impl Version {
    /// Parse `v?MAJOR(.MINOR(.PATCH...))(-pre)(+meta)`
    pub fn parse(s: &str) -> Option<Self> {
        let caps = SEMVER_RE.captures(s)?;
        let segments = caps
            .get(1)?
            .as_str()
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .ok()?;
        let pre = caps.get(2).map(|m| m.as_str().to_string());
        Some(Self { segments, pre })
    }

    /// Build a release version from numeric components
    pub fn new(segments: &[u64]) -> Self {
        Self {
            segments: segments.to_vec(),
            pre: None,
        }
    }

    /// Numeric component at `index`, zero when absent
    fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }
}

fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = (0..self.segments.len().max(3))
            .map(|i| self.segment(i).to_string())
            .collect();
        write!(f, "{}", parts.join("."))?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// Comparable key of a branch name.
///
/// Variant order is the sort order: unparsable names first, then real
/// versions, then the development branch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionKey {
    /// No version information
    Zero,
    /// A parsed semantic version
    Version(Version),
    /// Greater than any version
    Max,
}

impl VersionKey {
    /// Whether the key carries no version information
    pub const fn is_zero(&self) -> bool {
        matches!(self, Self::Zero)
    }
}

impl std::fmt::Display for VersionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "0"),
            Self::Version(v) => write!(f, "{v}"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Parse the version carried by the last path segment of a branch name
pub fn parse_branch_version(branch: &str) -> Option<Version> {
    let last = branch.rsplit('/').next().unwrap_or(branch);
    let last = last.strip_prefix(VERSION_TOKEN).unwrap_or(last);
    Version::parse(last)
}

/// Extract the ordering key of a branch name. Never fails.
pub fn extract_version(branch: &str) -> VersionKey {
    if let Some(version) = parse_branch_version(branch) {
        return VersionKey::Version(version);
    }
    if branch == DEVELOPMENT_TOKEN {
        return VersionKey::Max;
    }
    VersionKey::Zero
}

/// Sort branch names by ascending version, keeping the input order of
/// equal keys
pub fn sort_by_version(branches: &mut [String]) {
    branches.sort_by_key(|b| extract_version(b));
}
