//! Package discovery and the per-run package set

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::manifest::PackageManifest;
use crate::resolver::{parse_version, VersionResolver};
use crate::types::BumpKind;

/// Access to manifests as they were last committed.
///
/// Implemented by the git layer; tests substitute an in-memory fake.
pub trait ManifestHistory {
    /// Contents of the manifest as last committed, or `None` when the path
    /// has no committed state
    fn previous_manifest(&self, manifest_path: &Path) -> Result<Option<Vec<u8>>>;
}

/// One package directory and its versioning state for the run
#[derive(Debug)]
pub struct Package {
    name: String,
    package_dir: PathBuf,
    manifest_path: PathBuf,
    manifest: PackageManifest,
    resolver: VersionResolver,
}

impl Package {
    /// Build a package from an already-loaded manifest and its committed
    /// baseline version
    pub fn new(
        name: impl Into<String>,
        package_dir: impl Into<PathBuf>,
        manifest: PackageManifest,
        previous: Version,
    ) -> Result<Self> {
        let package_dir = package_dir.into();
        let current = parse_version(&manifest.version)?;

        Ok(Self {
            name: name.into(),
            manifest_path: package_dir.join("package.json"),
            package_dir,
            manifest,
            resolver: VersionResolver::new(previous, current),
        })
    }

    /// Load a package from its directory, resolving the committed baseline
    /// through `history`
    pub fn load(name: &str, package_dir: &Path, history: &dyn ManifestHistory) -> Result<Self> {
        let manifest_path = package_dir.join("package.json");
        let manifest = PackageManifest::load(&manifest_path)?;

        let previous = match history.previous_manifest(&manifest_path)? {
            Some(bytes) => {
                let committed = PackageManifest::from_slice(&bytes, &manifest_path)?;
                parse_version(&committed.version)?
            }
            None => {
                debug!(
                    package = name,
                    "no committed manifest, using working tree version as baseline"
                );
                parse_version(&manifest.version)?
            }
        };

        Self::new(name, package_dir, manifest, previous)
    }

    /// Directory name, the identity used by bump requests
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name the package is published under
    pub fn registry_name(&self) -> &str {
        &self.manifest.name
    }

    /// Whether the manifest is marked private
    pub fn is_private(&self) -> bool {
        self.manifest.is_private()
    }

    /// The package directory
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Path of the package's manifest
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The working-tree manifest
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Mutable access to the working-tree manifest
    pub fn manifest_mut(&mut self) -> &mut PackageManifest {
        &mut self.manifest
    }

    /// The version as last committed
    pub fn previous_version(&self) -> &Version {
        self.resolver.previous()
    }

    /// The version staged for this run
    pub fn staged_version(&self) -> &Version {
        self.resolver.staged()
    }

    /// Whether the staged version differs from the committed baseline
    pub fn is_changed(&self) -> bool {
        self.resolver.is_changed()
    }

    /// Stage a bump; returns whether the staged version moved
    pub fn bump(&mut self, kind: BumpKind) -> bool {
        self.resolver.bump(kind)
    }

    /// Overwrite the manifest's version field with the staged version and
    /// write the manifest to its own path
    pub fn write_manifest(&mut self) -> Result<()> {
        self.manifest.version = self.resolver.staged().to_string();
        self.manifest.save(&self.manifest_path)?;
        info!(
            package = %self.name,
            version = %self.manifest.version,
            path = %self.manifest_path.display(),
            "manifest written"
        );
        Ok(())
    }
}

/// All packages under the base directory, in directory-listing order.
///
/// The order is whatever the OS returns and is not guaranteed sorted; no
/// result may depend on it beyond the monotonic staging rule.
#[derive(Debug, Default)]
pub struct PackageSet {
    names: Vec<String>,
    packages: HashMap<String, Package>,
}

impl PackageSet {
    /// Load every immediate subdirectory of `base_dir` as a package
    pub fn load(base_dir: &Path, history: &dyn ManifestHistory) -> Result<Self> {
        let entries = fs::read_dir(base_dir).map_err(|e| ConfigError::BaseDirUnreadable {
            path: base_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut packages = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            packages.push(Package::load(&name, &path, history)?);
        }

        info!(
            count = packages.len(),
            base_dir = %base_dir.display(),
            "package set loaded"
        );
        Ok(Self::from_packages(packages))
    }

    /// Build a set from packages in the given order
    pub fn from_packages(packages: Vec<Package>) -> Self {
        let mut names = Vec::with_capacity(packages.len());
        let mut map = HashMap::with_capacity(packages.len());
        for package in packages {
            names.push(package.name().to_string());
            map.insert(package.name().to_string(), package);
        }
        Self {
            names,
            packages: map,
        }
    }

    /// Package directory names in set order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a package with this directory name exists
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Look up a package by directory name
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Mutable lookup by directory name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    /// Iterate packages in set order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.names.iter().filter_map(|name| self.packages.get(name))
    }

    /// Number of packages in the set
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// History fake keyed by manifest path
    struct FakeHistory {
        committed: HashMap<PathBuf, Vec<u8>>,
    }

    impl FakeHistory {
        fn empty() -> Self {
            Self {
                committed: HashMap::new(),
            }
        }

        fn with(mut self, path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
            self.committed.insert(path.into(), bytes.to_vec());
            self
        }
    }

    impl ManifestHistory for FakeHistory {
        fn previous_manifest(&self, manifest_path: &Path) -> Result<Option<Vec<u8>>> {
            Ok(self.committed.get(manifest_path).cloned())
        }
    }

    fn write_package(base: &Path, name: &str, json: &str) -> PathBuf {
        let dir = base.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), json).unwrap();
        dir
    }

    #[test]
    fn test_load_set_from_directories() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "core", r#"{"name": "core", "version": "1.0.0"}"#);
        write_package(temp.path(), "utils", r#"{"name": "utils", "version": "0.2.0"}"#);
        // Stray files are not packages
        fs::write(temp.path().join("README.md"), "docs").unwrap();

        let set = PackageSet::load(temp.path(), &FakeHistory::empty()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("core"));
        assert!(set.contains("utils"));
        assert!(!set.contains("README.md"));
    }

    #[test]
    fn test_missing_base_dir_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("packages");
        let result = PackageSet::load(&missing, &FakeHistory::empty());
        assert!(result.is_err());
    }

    #[test]
    fn test_subdirectory_without_manifest_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("broken")).unwrap();

        let result = PackageSet::load(temp.path(), &FakeHistory::empty());
        assert!(result.is_err());
    }

    #[test]
    fn test_previous_version_comes_from_history() {
        let temp = TempDir::new().unwrap();
        let dir = write_package(temp.path(), "core", r#"{"name": "core", "version": "1.1.0"}"#);

        let history = FakeHistory::empty().with(
            dir.join("package.json"),
            br#"{"name": "core", "version": "1.0.0"}"#,
        );

        let set = PackageSet::load(temp.path(), &history).unwrap();
        let core = set.get("core").unwrap();
        assert_eq!(core.previous_version().to_string(), "1.0.0");
        assert_eq!(core.staged_version().to_string(), "1.1.0");
        assert!(core.is_changed());
    }

    #[test]
    fn test_uncommitted_package_uses_working_tree_baseline() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "fresh", r#"{"name": "fresh", "version": "0.1.0"}"#);

        let set = PackageSet::load(temp.path(), &FakeHistory::empty()).unwrap();
        let fresh = set.get("fresh").unwrap();
        assert_eq!(fresh.previous_version(), fresh.staged_version());
        assert!(!fresh.is_changed());
    }

    #[test]
    fn test_unparsable_version_is_fatal() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "bad", r#"{"name": "bad", "version": "one"}"#);

        let result = PackageSet::load(temp.path(), &FakeHistory::empty());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_manifest_uses_package_path() {
        let temp = TempDir::new().unwrap();
        let dir = write_package(
            temp.path(),
            "core",
            r#"{"name": "core", "version": "1.0.0", "license": "MIT"}"#,
        );

        let mut set = PackageSet::load(temp.path(), &FakeHistory::empty()).unwrap();
        let core = set.get_mut("core").unwrap();
        core.bump(BumpKind::Minor);
        core.write_manifest().unwrap();

        let written = PackageManifest::load(&dir.join("package.json")).unwrap();
        assert_eq!(written.version, "1.1.0");
        assert_eq!(
            written.other.get("license").and_then(|v| v.as_str()),
            Some("MIT")
        );
    }

    #[test]
    fn test_iteration_follows_set_order() {
        let a = Package::new(
            "a",
            "packages/a",
            PackageManifest {
                name: "a".to_string(),
                version: "1.0.0".to_string(),
                private: None,
                dependencies: None,
                dev_dependencies: None,
                other: HashMap::new(),
            },
            Version::new(1, 0, 0),
        )
        .unwrap();
        let b = Package::new(
            "b",
            "packages/b",
            PackageManifest {
                name: "b".to_string(),
                version: "1.0.0".to_string(),
                private: None,
                dependencies: None,
                dev_dependencies: None,
                other: HashMap::new(),
            },
            Version::new(1, 0, 0),
        )
        .unwrap();

        let set = PackageSet::from_packages(vec![b, a]);
        let order: Vec<&str> = set.iter().map(|p| p.name()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(set.names(), &["b".to_string(), "a".to_string()]);
    }
}
