//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "gantry.toml";

/// Default directory containing the packages
pub const DEFAULT_BASE_DIR: &str = "packages";

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing one subdirectory per package
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = toml::from_str(&content).map_err(ConfigError::TomlError)?;
        Ok(config)
    }

    /// Load `gantry.toml` from the given directory, falling back to defaults
    /// when no file is present
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            debug!(path = %path.display(), "loading configuration");
            Self::load(&path)
        } else {
            debug!("no configuration file found, using defaults");
            Ok(Self::default())
        }
    }
}
