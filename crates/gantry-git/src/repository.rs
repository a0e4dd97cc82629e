//! Git repository operations

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, info, instrument};

use gantry_core::error::GitError;
use gantry_core::package::ManifestHistory;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(start_path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents of a file in the HEAD tree, or `None` when HEAD does not
    /// have the path (new file, or a repository without commits)
    #[instrument(skip(self))]
    pub fn file_at_head(&self, relative: &Path) -> Result<Option<Vec<u8>>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                debug!("repository has no commits yet");
                return Ok(None);
            }
            Err(e) => return Err(GitError::Git2(e)),
        };

        let commit = head.peel_to_commit().map_err(GitError::Git2)?;
        let tree = commit.tree().map_err(GitError::Git2)?;

        let entry = match tree.get_path(relative) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                debug!(path = %relative.display(), "path not in HEAD tree");
                return Ok(None);
            }
            Err(e) => return Err(GitError::Git2(e)),
        };

        let object = entry.to_object(&self.repo).map_err(GitError::Git2)?;
        let blob = object.peel_to_blob().map_err(GitError::Git2)?;
        Ok(Some(blob.content().to_vec()))
    }

    /// Map a path to its form relative to the working directory.
    ///
    /// Both sides are canonicalized first so symlinked temp directories
    /// (macOS /var -> /private/var) compare equal.
    fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self.repo.workdir().ok_or(GitError::NoWorkdir)?;
        let workdir = workdir
            .canonicalize()
            .map_err(|e| GitError::PathResolveFailed {
                path: workdir.to_path_buf(),
                reason: e.to_string(),
            })?;
        let canonical = path
            .canonicalize()
            .map_err(|e| GitError::PathResolveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        canonical
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::OutsideWorkdir(path.to_path_buf()))
    }
}

impl ManifestHistory for GitRepo {
    fn previous_manifest(&self, manifest_path: &Path) -> gantry_core::Result<Option<Vec<u8>>> {
        let relative = self.relative_to_workdir(manifest_path)?;
        Ok(self.file_at_head(&relative)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::open(temp.path()).unwrap();
        (temp, repo)
    }

    fn commit_all(repo: &GitRepo, message: &str) {
        let mut index = repo.repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();

        let parents = match repo.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        repo.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    #[test]
    fn test_open_repo() {
        let (_temp, repo) = init_repo();
        assert!(repo.path().exists());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();

        let subdir = temp.path().join("packages").join("core");
        fs::create_dir_all(&subdir).unwrap();

        let repo = GitRepo::discover(&subdir).unwrap();
        let repo_path = repo.path().canonicalize().unwrap();
        let temp_path = temp.path().canonicalize().unwrap();
        assert_eq!(repo_path, temp_path);
    }

    #[test]
    fn test_not_a_repo() {
        let temp = TempDir::new().unwrap();
        let result = GitRepo::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_file_at_head_ignores_working_tree_edits() {
        let (temp, repo) = init_repo();
        let dir = temp.path().join("packages").join("core");
        fs::create_dir_all(&dir).unwrap();
        let manifest = dir.join("package.json");
        fs::write(&manifest, r#"{"name": "core", "version": "1.0.0"}"#).unwrap();
        commit_all(&repo, "add core");

        // Edit the working tree after the commit
        fs::write(&manifest, r#"{"name": "core", "version": "2.0.0"}"#).unwrap();

        let bytes = repo
            .file_at_head(Path::new("packages/core/package.json"))
            .unwrap()
            .unwrap();
        assert_eq!(bytes, br#"{"name": "core", "version": "1.0.0"}"#);
    }

    #[test]
    fn test_file_at_head_missing_path() {
        let (temp, repo) = init_repo();
        fs::write(temp.path().join("README.md"), "hello").unwrap();
        commit_all(&repo, "init");

        let result = repo.file_at_head(Path::new("packages/ghost/package.json"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_file_at_head_without_commits() {
        let (_temp, repo) = init_repo();
        let result = repo.file_at_head(Path::new("anything"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_previous_manifest_maps_absolute_paths() {
        let (temp, repo) = init_repo();
        let dir = temp.path().join("packages").join("core");
        fs::create_dir_all(&dir).unwrap();
        let manifest = dir.join("package.json");
        fs::write(&manifest, r#"{"name": "core", "version": "1.0.0"}"#).unwrap();
        commit_all(&repo, "add core");

        fs::write(&manifest, r#"{"name": "core", "version": "1.5.0"}"#).unwrap();

        let bytes = repo.previous_manifest(&manifest).unwrap().unwrap();
        assert_eq!(bytes, br#"{"name": "core", "version": "1.0.0"}"#);
    }

    #[test]
    fn test_previous_manifest_new_package_is_none() {
        let (temp, repo) = init_repo();
        fs::write(temp.path().join("README.md"), "hello").unwrap();
        commit_all(&repo, "init");

        let dir = temp.path().join("packages").join("fresh");
        fs::create_dir_all(&dir).unwrap();
        let manifest = dir.join("package.json");
        fs::write(&manifest, r#"{"name": "fresh", "version": "0.1.0"}"#).unwrap();

        assert!(repo.previous_manifest(&manifest).unwrap().is_none());
    }

    #[test]
    fn test_path_outside_workdir_is_rejected() {
        let (temp, repo) = init_repo();
        fs::write(temp.path().join("README.md"), "hello").unwrap();
        commit_all(&repo, "init");

        let other = TempDir::new().unwrap();
        let outside = other.path().join("package.json");
        fs::write(&outside, "{}").unwrap();

        assert!(repo.previous_manifest(&outside).is_err());
    }
}
