//! Version staging against the committed baseline

use semver::{BuildMetadata, Prerelease, Version};
use tracing::debug;

use crate::error::VersionError;
use crate::types::BumpKind;

/// Parse a semver version string
pub fn parse_version(value: &str) -> std::result::Result<Version, VersionError> {
    Version::parse(value)
        .map_err(|e| VersionError::ParseFailed(value.to_string(), e.to_string()))
}

/// Holds one package's committed baseline and its staged version.
///
/// `previous` is the version as last committed and never changes during a
/// run; `staged` starts at the working-tree version and only ever moves
/// upward. Every bump candidate is computed from `previous`, not from
/// `staged`, so repeated bumps of any mix of kinds settle on the largest
/// candidate regardless of call order.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    previous: Version,
    staged: Version,
}

impl VersionResolver {
    /// Create a resolver from the committed and working-tree versions
    pub fn new(previous: Version, current: Version) -> Self {
        Self {
            previous,
            staged: current,
        }
    }

    /// The version as last committed
    pub fn previous(&self) -> &Version {
        &self.previous
    }

    /// The version staged for this run
    pub fn staged(&self) -> &Version {
        &self.staged
    }

    /// Whether the staged version differs from the committed baseline
    pub fn is_changed(&self) -> bool {
        self.staged != self.previous
    }

    /// Stage a bump of the given kind.
    ///
    /// The candidate replaces the staged version only when strictly greater
    /// under semver precedence; returns whether the staged version moved.
    pub fn bump(&mut self, kind: BumpKind) -> bool {
        let mut candidate = self.previous.clone();
        match kind {
            BumpKind::Major => {
                candidate.major += 1;
                candidate.minor = 0;
                candidate.patch = 0;
            }
            BumpKind::Minor => {
                candidate.minor += 1;
                candidate.patch = 0;
            }
            BumpKind::Patch => {
                candidate.patch += 1;
            }
        }
        candidate.pre = Prerelease::EMPTY;
        candidate.build = BuildMetadata::EMPTY;

        if candidate > self.staged {
            debug!(from = %self.staged, to = %candidate, kind = %kind, "staging version");
            self.staged = candidate;
            true
        } else {
            debug!(
                candidate = %candidate,
                staged = %self.staged,
                kind = %kind,
                "candidate not greater than staged version, keeping"
            );
            false
        }
    }
}
