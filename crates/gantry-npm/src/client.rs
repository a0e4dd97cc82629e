//! npm CLI client

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use semver::Version;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use gantry_core::error::{PublishError, Result};
use gantry_core::publish::Registry;
use gantry_core::resolver::parse_version;

/// Client that shells out to the npm CLI
pub struct NpmClient {
    npm: PathBuf,
    registry: Option<String>,
}

impl NpmClient {
    /// Locate npm on PATH and build a client
    pub fn new() -> Result<Self> {
        let npm = which::which("npm").map_err(|e| PublishError::NpmNotFound(e.to_string()))?;
        debug!(npm = %npm.display(), "located npm");
        Ok(Self {
            npm,
            registry: None,
        })
    }

    /// Use a specific npm binary instead of searching PATH
    pub fn with_npm_path(npm: impl Into<PathBuf>) -> Self {
        Self {
            npm: npm.into(),
            registry: None,
        }
    }

    /// Forward `--registry <url>` to every npm invocation
    pub fn with_registry(mut self, registry: Option<String>) -> Self {
        self.registry = registry;
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.npm);
        cmd.args(args);
        if let Some(registry) = &self.registry {
            cmd.arg("--registry").arg(registry);
        }
        cmd
    }
}

/// Whether stderr from `npm show` means the package was never published
fn is_unpublished(stderr: &str) -> bool {
    stderr.contains("E404") || stderr.contains("404 Not Found")
}

/// Parse the single version line `npm show <name> version` prints
fn parse_show_output(stdout: &str) -> std::result::Result<Version, String> {
    parse_version(stdout.trim()).map_err(|e| e.to_string())
}

#[async_trait]
impl Registry for NpmClient {
    #[instrument(skip(self))]
    async fn latest_version(&self, registry_name: &str) -> Result<Option<Version>> {
        let output = self
            .command(&["show", registry_name, "version"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PublishError::CommandFailed {
                command: format!("npm show {} version", registry_name),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_unpublished(&stderr) {
                debug!(package = registry_name, "package not in registry");
                return Ok(None);
            }
            return Err(PublishError::QueryFailed {
                package: registry_name.to_string(),
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_show_output(&stdout).map_err(|reason| PublishError::QueryFailed {
            package: registry_name.to_string(),
            reason,
        })?;
        debug!(package = registry_name, version = %version, "registry version");
        Ok(Some(version))
    }

    /// Runs `npm publish` in the package directory with stdout and stderr
    /// inherited, so npm's own output streams to the console as it happens.
    #[instrument(skip(self), fields(package_dir = %package_dir.display()))]
    async fn publish(&self, package_dir: &Path) -> Result<i32> {
        debug!("running npm publish");
        let status = self
            .command(&["publish"])
            .current_dir(package_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| PublishError::CommandFailed {
                command: "npm publish".to_string(),
                reason: e.to_string(),
            })?;

        // A signal-terminated process has no exit code; report plain failure
        let code = status.code().unwrap_or(1);
        if code != 0 {
            warn!(code, "npm publish exited nonzero");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_unpublished_detection() {
        assert!(is_unpublished("npm ERR! code E404\nnpm ERR! 404 Not Found"));
        assert!(!is_unpublished("npm ERR! code EOTP"));
        assert!(!is_unpublished(""));
    }

    #[test]
    fn test_parse_show_output() {
        assert_eq!(parse_show_output("1.2.3\n").unwrap(), Version::new(1, 2, 3));
        assert!(parse_show_output("").is_err());
        assert!(parse_show_output("not a version").is_err());
    }

    #[test]
    fn test_registry_flag_forwarded() {
        let client = NpmClient::with_npm_path("npm")
            .with_registry(Some("https://registry.example.com".to_string()));
        let cmd = client.command(&["show", "pkg", "version"]);

        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("show"),
                OsStr::new("pkg"),
                OsStr::new("version"),
                OsStr::new("--registry"),
                OsStr::new("https://registry.example.com"),
            ]
        );
    }

    #[test]
    fn test_no_registry_flag_by_default() {
        let client = NpmClient::with_npm_path("npm");
        let cmd = client.command(&["publish"]);

        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(args, vec![OsStr::new("publish")]);
    }
}
