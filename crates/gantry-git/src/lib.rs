//! Gantry Git - repository access for release runs
//!
//! Provides the git-backed view of package manifests as they were last
//! committed, which is the baseline every version computation starts from.

mod repository;

pub use repository::{GitRepo, Result};
