//! package.json handling

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};

/// Which manifest section declares a dependency.
///
/// `devDependencies` is consulted before `dependencies`, so a name listed in
/// both sections counts as a dev dependency only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Listed under `devDependencies`
    Dev,
    /// Listed under `dependencies`
    Regular,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "devDependencies"),
            Self::Regular => write!(f, "dependencies"),
        }
    }
}

/// package.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Registry name of the package
    pub name: String,

    /// Package version
    pub version: String,

    /// Whether the package is private
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    /// Dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<HashMap<String, String>>,

    /// Dev dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<HashMap<String, String>>,

    /// Preserve other fields
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

impl PackageManifest {
    /// Load a manifest from a path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|_| ManifestError::NotFound(path.to_path_buf()))?;

        serde_json::from_str(&content).map_err(|e| {
            ManifestError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Parse a manifest from raw bytes, with `origin` used for error context
    pub fn from_slice(bytes: &[u8], origin: &Path) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            ManifestError::ParseFailed {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Save the manifest to a path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            ManifestError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        // Ensure trailing newline
        let content = if content.ends_with('\n') {
            content
        } else {
            format!("{}\n", content)
        };

        fs::write(path, content).map_err(|e| {
            ManifestError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Whether the manifest is marked private
    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }

    /// Section that lists `name` as a dependency, if any
    pub fn dependency_kind_of(&self, name: &str) -> Option<DependencyKind> {
        if self
            .dev_dependencies
            .as_ref()
            .map_or(false, |deps| deps.contains_key(name))
        {
            Some(DependencyKind::Dev)
        } else if self
            .dependencies
            .as_ref()
            .map_or(false, |deps| deps.contains_key(name))
        {
            Some(DependencyKind::Regular)
        } else {
            None
        }
    }

    /// Rewrite the range for `name` to `^version`, replacing whatever range
    /// operator was there. Returns the section rewritten, or `None` when the
    /// manifest does not depend on `name`.
    pub fn pin_dependency(&mut self, name: &str, version: &Version) -> Option<DependencyKind> {
        let range = format!("^{}", version);

        if let Some(entry) = self
            .dev_dependencies
            .as_mut()
            .and_then(|deps| deps.get_mut(name))
        {
            *entry = range;
            return Some(DependencyKind::Dev);
        }

        if let Some(entry) = self
            .dependencies
            .as_mut()
            .and_then(|deps| deps.get_mut(name))
        {
            *entry = range;
            return Some(DependencyKind::Regular);
        }

        None
    }
}
