//! Console output formatting

use console::style;

use gantry_core::package::PackageSet;
use gantry_core::publish::{
    PublishObserver, PublishOutcome, PublishPlan, PublishReport, QueuedPublish, RunStatus,
};

/// Print staged version changes for a bump-only run
pub fn print_bumps(set: &PackageSet) {
    for package in set.iter().filter(|p| p.is_changed()) {
        println!(
            " - {} ({}): {} => {}",
            style(package.name()).bold(),
            package.registry_name(),
            style(package.previous_version()).dim(),
            style(package.staged_version()).green().bright()
        );
    }
}

/// Print the publish queue, one line per package
pub fn print_plan(plan: &PublishPlan) {
    for entry in &plan.queued {
        let registry_version = entry
            .registry_version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            " - {} ({}): {} => {}",
            style(&entry.name).bold(),
            entry.registry_name,
            style(registry_version).dim(),
            style(&entry.version).green().bright()
        );
    }
    for failure in &plan.query_failures {
        eprintln!(
            " - {} ({}): {}",
            style(&failure.name).bold(),
            failure.registry_name,
            style(&failure.reason).red()
        );
    }
}

/// Observer that echoes publish commands and failures as the queue drains
pub struct ConsoleObserver {
    quiet: bool,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl PublishObserver for ConsoleObserver {
    fn publish_started(&self, entry: &QueuedPublish) {
        if !self.quiet {
            println!(
                "{} {}",
                style("$ npm publish").blue(),
                style(format!("({})", entry.name)).dim()
            );
        }
    }

    fn publish_finished(&self, outcome: &PublishOutcome) {
        if self.quiet || outcome.success {
            return;
        }
        match outcome.exit_code {
            Some(code) => eprintln!(
                "{}",
                style(format!(
                    "npm publish for {} exited with code {}",
                    outcome.name, code
                ))
                .red()
            ),
            None => {
                if let Some(error) = &outcome.error {
                    eprintln!(
                        "{}",
                        style(format!("{}: {}", outcome.name, error)).red()
                    );
                }
            }
        }
    }
}

/// Print the run summary line
pub fn print_summary(report: &PublishReport) {
    match &report.status {
        RunStatus::NothingToPublish => println!("No packages to publish."),
        RunStatus::Succeeded => println!("{}", style("Publish succeeded.").green().bold()),
        RunStatus::Failed { first_exit_code } => match first_exit_code {
            Some(code) => println!(
                "{} (exit code {})",
                style("Publish failed.").red().bold(),
                code
            ),
            None => println!("{}", style("Publish failed.").red().bold()),
        },
    }
}
