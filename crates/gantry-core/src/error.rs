//! Error types for gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Manifest-related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Publish-related errors
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Packages directory missing or unreadable
    #[error("Cannot read packages directory {path}: {reason}")]
    BaseDirUnreadable { path: PathBuf, reason: String },

    /// TOML parsing error
    #[error("Failed to parse configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Manifest-related errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse a manifest
    #[error("Failed to parse manifest {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// Failed to write a manifest
    #[error("Failed to write manifest {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse a version string
    #[error("Failed to parse version {0}: {1}")]
    ParseFailed(String, String),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Repository has no working directory
    #[error("Repository has no working directory")]
    NoWorkdir,

    /// Path cannot be resolved on disk
    #[error("Failed to resolve path {path}: {reason}")]
    PathResolveFailed { path: PathBuf, reason: String },

    /// Path is not inside the repository working directory
    #[error("Path is outside the repository working directory: {0}")]
    OutsideWorkdir(PathBuf),

    /// Underlying git error
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Publish-related errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// npm binary could not be located
    #[error("npm executable not found: {0}")]
    NpmNotFound(String),

    /// Registry query failed
    #[error("Registry query for {package} failed: {reason}")]
    QueryFailed { package: String, reason: String },

    /// External command could not be run
    #[error("Failed to run {command}: {reason}")]
    CommandFailed { command: String, reason: String },
}
