//! Gantry Core - version coordination for monorepos
//!
//! This crate provides the package model, version staging, dependency
//! propagation, and publish planning behind the gantry CLI. Git access and
//! registry access stay behind the [`package::ManifestHistory`] and
//! [`publish::Registry`] traits so they can be injected.

pub mod bump;
pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod publish;
pub mod resolver;
pub mod types;

pub use bump::GraphBumper;
pub use config::Config;
pub use error::{GantryError, Result};
pub use graph::{DependencyEdge, DependencyGraph};
pub use manifest::{DependencyKind, PackageManifest};
pub use package::{ManifestHistory, Package, PackageSet};
pub use publish::{
    NoopObserver, PublishObserver, PublishOptions, PublishOutcome, PublishPlan, PublishReport,
    Publisher, QueuedPublish, Registry, RunStatus,
};
pub use resolver::{parse_version, VersionResolver};
pub use types::BumpKind;
