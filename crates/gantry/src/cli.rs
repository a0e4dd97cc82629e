//! Command-line interface

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use gantry_core::bump::GraphBumper;
use gantry_core::config::Config;
use gantry_core::package::PackageSet;
use gantry_core::publish::{PublishOptions, PublishReport, Publisher, RunStatus};
use gantry_core::types::BumpKind;
use gantry_git::GitRepo;
use gantry_npm::NpmClient;

use crate::output;

/// Bump package versions across a monorepo and publish the result
#[derive(Debug, Parser)]
#[command(name = "gantry", version, about, long_about = None)]
pub struct Cli {
    /// Package directory names to bump
    pub names: Vec<String>,

    /// Bump every package in the set
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Bump the major version component
    #[arg(short = '1', long)]
    pub major: bool,

    /// Bump the minor version component
    #[arg(short = '2', long)]
    pub minor: bool,

    /// Bump the patch version component (the default)
    #[arg(short = '3', long)]
    pub patch: bool,

    /// Write manifests and publish changed packages
    #[arg(short = 'p', long)]
    pub publish: bool,

    /// With --publish: show the plan without writing or publishing
    #[arg(long)]
    pub dry_run: bool,

    /// npm registry to query and publish to
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Directory containing the packages
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Run as if started from this directory
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors and essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Run the requested bumps, then optionally the publish pass
    pub fn execute(self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            env::set_current_dir(dir)
                .with_context(|| format!("failed to change directory to {}", dir.display()))?;
        }

        let cwd = env::current_dir().context("failed to resolve working directory")?;
        let config = Config::load_or_default(&cwd)?;
        let base_dir = cwd.join(self.base_dir.clone().unwrap_or(config.base_dir));

        let repo = GitRepo::discover(&cwd)?;
        debug!(repository = %repo.path().display(), "repository discovered");
        let mut set = PackageSet::load(&base_dir, &repo)?;

        let bumper = GraphBumper::new(&set);
        let kind = self.bump_kind();
        let selected: Vec<String> = if self.all {
            set.names().to_vec()
        } else {
            self.names.clone()
        };

        for name in &selected {
            bumper.bump(&mut set, name, kind);
        }

        if self.publish {
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(self.run_publish(&mut set))?;
            if matches!(report.status, RunStatus::Failed { .. }) {
                anyhow::bail!("one or more packages failed to publish");
            }
        } else if !self.quiet {
            // Without --publish nothing touches disk; show the staged state
            output::print_bumps(&set);
        }

        Ok(())
    }

    /// The requested bump kind; flags take precedence major > minor > patch
    fn bump_kind(&self) -> BumpKind {
        if self.major {
            BumpKind::Major
        } else if self.minor {
            BumpKind::Minor
        } else {
            BumpKind::Patch
        }
    }

    async fn run_publish(&self, set: &mut PackageSet) -> anyhow::Result<PublishReport> {
        let registry = NpmClient::new()?.with_registry(self.registry.clone());
        let publisher = Publisher::new(PublishOptions {
            dry_run: self.dry_run,
        });

        let plan = publisher.plan(set, &registry).await?;
        if !self.quiet {
            output::print_plan(&plan);
        }

        let observer = output::ConsoleObserver::new(self.quiet);
        let report = publisher.run(plan, &registry, &observer).await?;
        if !self.quiet {
            output::print_summary(&report);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_names_and_flags() {
        let cli = Cli::parse_from(["gantry", "core", "utils", "-p"]);
        assert_eq!(cli.names, vec!["core".to_string(), "utils".to_string()]);
        assert!(cli.publish);
        assert!(!cli.all);
    }

    #[test]
    fn test_numeric_short_flags() {
        let cli = Cli::parse_from(["gantry", "-2", "core"]);
        assert!(cli.minor);
        assert_eq!(cli.bump_kind(), BumpKind::Minor);
    }

    #[test]
    fn test_bump_kind_precedence() {
        let cli = Cli::parse_from(["gantry", "--major", "--minor", "--patch"]);
        assert_eq!(cli.bump_kind(), BumpKind::Major);

        let cli = Cli::parse_from(["gantry", "--minor", "--patch"]);
        assert_eq!(cli.bump_kind(), BumpKind::Minor);

        let cli = Cli::parse_from(["gantry"]);
        assert_eq!(cli.bump_kind(), BumpKind::Patch);
    }

    #[test]
    fn test_dry_run_and_registry() {
        let cli = Cli::parse_from([
            "gantry",
            "-a",
            "-p",
            "--dry-run",
            "--registry",
            "https://registry.example.com",
        ]);
        assert!(cli.all);
        assert!(cli.dry_run);
        assert_eq!(
            cli.registry.as_deref(),
            Some("https://registry.example.com")
        );
    }
}
