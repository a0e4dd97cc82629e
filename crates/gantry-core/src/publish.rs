//! Publish planning and execution

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use semver::Version;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::package::PackageSet;

/// Remote registry operations.
///
/// Implemented by the npm layer; tests substitute a fake.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Latest published version of a package, or `None` when it has never
    /// been published
    async fn latest_version(&self, registry_name: &str) -> Result<Option<Version>>;

    /// Publish the package in `package_dir`; returns the exit code of the
    /// publish process. Failure to run the process at all is an `Err`.
    async fn publish(&self, package_dir: &Path) -> Result<i32>;
}

/// Callbacks fired while the publish queue drains
pub trait PublishObserver: Send + Sync {
    /// A queue entry is about to be published
    fn publish_started(&self, _entry: &QueuedPublish) {}

    /// A queue entry finished, successfully or not
    fn publish_finished(&self, _outcome: &PublishOutcome) {}
}

/// Observer that does nothing
pub struct NoopObserver;

impl PublishObserver for NoopObserver {}

/// Options for a publish pass
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishOptions {
    /// Plan and report without writing manifests or invoking the registry
    pub dry_run: bool,
}

/// One entry in the publish queue
#[derive(Debug, Clone)]
pub struct QueuedPublish {
    /// Directory name of the package
    pub name: String,
    /// Name the package is published under
    pub registry_name: String,
    /// Package directory the publish runs in
    pub package_dir: PathBuf,
    /// Version being published
    pub version: Version,
    /// Latest version the registry reported, if any
    pub registry_version: Option<Version>,
}

/// Why a package was left out of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Staged version equals the committed baseline
    Unchanged,
    /// Manifest is marked private
    Private,
    /// Registry already has this version or newer
    AlreadyPublished,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged since last commit"),
            Self::Private => write!(f, "marked private"),
            Self::AlreadyPublished => write!(f, "already published"),
        }
    }
}

/// A package left out of the queue
#[derive(Debug, Clone)]
pub struct SkippedPackage {
    /// Directory name of the package
    pub name: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// A registry query that failed during planning.
///
/// The package cannot be published this run, but the run continues; the
/// failure surfaces as a failed outcome in the final report.
#[derive(Debug, Clone)]
pub struct QueryFailure {
    /// Directory name of the package
    pub name: String,
    /// Name the package is published under
    pub registry_name: String,
    /// Version that would have been published
    pub version: Version,
    /// What the query reported
    pub reason: String,
}

/// Result of planning a publish pass
#[derive(Debug, Default)]
pub struct PublishPlan {
    /// Packages to publish, in set order
    pub queued: Vec<QueuedPublish>,
    /// Packages left out, with reasons
    pub skipped: Vec<SkippedPackage>,
    /// Packages whose registry query failed
    pub query_failures: Vec<QueryFailure>,
}

/// Result of one publish invocation
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Directory name of the package
    pub name: String,
    /// Name the package is published under
    pub registry_name: String,
    /// Version that was published
    pub version: Version,
    /// Whether the publish succeeded
    pub success: bool,
    /// Exit code of the publish process, when one ran
    pub exit_code: Option<i32>,
    /// Failure detail, when the publish failed
    pub error: Option<String>,
    /// How long the publish took
    pub duration: Duration,
}

/// Overall result of the publish pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The queue was empty and nothing failed
    NothingToPublish,
    /// Every publish succeeded
    Succeeded,
    /// At least one package failed; carries the first failing exit code
    Failed { first_exit_code: Option<i32> },
}

/// Report for a completed publish pass
#[derive(Debug)]
pub struct PublishReport {
    /// Per-package outcomes in execution order, query failures last
    pub outcomes: Vec<PublishOutcome>,
    /// Overall status
    pub status: RunStatus,
    /// Wall-clock duration of the queue drain
    pub total_duration: Duration,
}

/// Plans and runs publish passes over a package set
pub struct Publisher {
    options: PublishOptions,
}

impl Publisher {
    /// Create a publisher with the given options
    pub fn new(options: PublishOptions) -> Self {
        Self { options }
    }

    /// Walk the set in order, write out changed manifests, and decide what
    /// gets published.
    ///
    /// Unchanged packages are skipped untouched. Changed packages get their
    /// manifest written to the package's own manifest path (suppressed under
    /// dry run), then private packages stop there. The rest are queued
    /// unless the registry already has the staged version or newer; a failed
    /// query is recorded and planning continues.
    pub async fn plan(
        &self,
        set: &mut PackageSet,
        registry: &dyn Registry,
    ) -> Result<PublishPlan> {
        let mut plan = PublishPlan::default();

        for name in set.names().to_vec() {
            let package = match set.get_mut(&name) {
                Some(package) => package,
                None => continue,
            };

            if !package.is_changed() {
                debug!(package = %name, "version unchanged, skipping");
                plan.skipped.push(SkippedPackage {
                    name,
                    reason: SkipReason::Unchanged,
                });
                continue;
            }

            if self.options.dry_run {
                debug!(package = %name, "dry run, manifest not written");
            } else {
                package.write_manifest()?;
            }

            if package.is_private() {
                info!(package = %name, "private package, not publishing");
                plan.skipped.push(SkippedPackage {
                    name,
                    reason: SkipReason::Private,
                });
                continue;
            }

            let registry_name = package.registry_name().to_string();
            let version = package.staged_version().clone();
            let package_dir = package.package_dir().to_path_buf();

            match registry.latest_version(&registry_name).await {
                Ok(registry_version) => {
                    if let Some(latest) = &registry_version {
                        if *latest >= version {
                            debug!(
                                package = %name,
                                registry_version = %latest,
                                staged = %version,
                                "registry is current, skipping"
                            );
                            plan.skipped.push(SkippedPackage {
                                name,
                                reason: SkipReason::AlreadyPublished,
                            });
                            continue;
                        }
                    }
                    plan.queued.push(QueuedPublish {
                        name,
                        registry_name,
                        package_dir,
                        version,
                        registry_version,
                    });
                }
                Err(e) => {
                    warn!(package = %name, error = %e, "registry query failed");
                    plan.query_failures.push(QueryFailure {
                        name,
                        registry_name,
                        version,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            queued = plan.queued.len(),
            skipped = plan.skipped.len(),
            query_failures = plan.query_failures.len(),
            "publish plan ready"
        );
        Ok(plan)
    }

    /// Drain the queue strictly sequentially: each publish runs to process
    /// exit before the next starts.
    ///
    /// Nonzero exits are recorded per package and the queue keeps going,
    /// retaining the first failing exit code for the report. An error from
    /// the registry itself (the process could not run) aborts the run and
    /// the remaining queue.
    pub async fn run(
        &self,
        plan: PublishPlan,
        registry: &dyn Registry,
        observer: &dyn PublishObserver,
    ) -> Result<PublishReport> {
        let started = Instant::now();
        let mut outcomes = Vec::new();
        let mut first_exit_code: Option<i32> = None;

        for entry in &plan.queued {
            observer.publish_started(entry);
            let begun = Instant::now();

            let (success, exit_code, error) = if self.options.dry_run {
                debug!(package = %entry.name, "dry run, publish not invoked");
                (true, None, None)
            } else {
                let code = registry.publish(&entry.package_dir).await?;
                if code == 0 {
                    (true, Some(0), None)
                } else {
                    (
                        false,
                        Some(code),
                        Some(format!("publish exited with code {}", code)),
                    )
                }
            };

            if !success && first_exit_code.is_none() {
                first_exit_code = exit_code;
            }

            let outcome = PublishOutcome {
                name: entry.name.clone(),
                registry_name: entry.registry_name.clone(),
                version: entry.version.clone(),
                success,
                exit_code,
                error,
                duration: begun.elapsed(),
            };

            if outcome.success {
                info!(package = %outcome.name, version = %outcome.version, "published");
            } else {
                warn!(package = %outcome.name, code = ?outcome.exit_code, "publish failed");
            }

            observer.publish_finished(&outcome);
            outcomes.push(outcome);
        }

        for failure in &plan.query_failures {
            let outcome = PublishOutcome {
                name: failure.name.clone(),
                registry_name: failure.registry_name.clone(),
                version: failure.version.clone(),
                success: false,
                exit_code: None,
                error: Some(failure.reason.clone()),
                duration: Duration::ZERO,
            };
            observer.publish_finished(&outcome);
            outcomes.push(outcome);
        }

        let status = if outcomes.is_empty() {
            RunStatus::NothingToPublish
        } else if outcomes.iter().any(|outcome| !outcome.success) {
            RunStatus::Failed { first_exit_code }
        } else {
            RunStatus::Succeeded
        };

        info!(outcomes = outcomes.len(), status = ?status, "publish pass finished");
        Ok(PublishReport {
            outcomes,
            status,
            total_duration: started.elapsed(),
        })
    }
}
