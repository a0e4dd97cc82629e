//! Gantry npm - registry access for release runs
//!
//! Shells out to the npm CLI for version queries and publishes, implementing
//! the registry seam the core publish pass runs against.

mod client;

pub use client::NpmClient;
