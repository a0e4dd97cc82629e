//! Cascading version bumps across the dependency graph

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use crate::graph::DependencyGraph;
use crate::package::PackageSet;
use crate::types::BumpKind;

/// Applies a bump to one package and cascades patch bumps through its
/// dependents, rewriting their dependency ranges along the way.
///
/// Each call to [`bump`](GraphBumper::bump) runs one propagation wave over
/// an explicit worklist. An edge is walked at most once per wave, so a
/// cyclic graph settles at a fixed point instead of recursing forever.
#[derive(Debug)]
pub struct GraphBumper {
    graph: DependencyGraph,
}

impl GraphBumper {
    /// Build a bumper for the given set, constructing its dependency graph
    pub fn new(set: &PackageSet) -> Self {
        Self {
            graph: DependencyGraph::build(set),
        }
    }

    /// Bump `name` by `kind` and cascade through its dependents.
    ///
    /// Unknown names are tolerated no-ops. Dependents are patch-bumped and
    /// their matching dependency range is rewritten to `^staged` whether or
    /// not the staged version moved; candidates that are not strictly
    /// greater than the staged version are discarded by the resolver, which
    /// is what makes repeated waves converge.
    pub fn bump(&self, set: &mut PackageSet, name: &str, kind: BumpKind) {
        if !set.contains(name) {
            debug!(package = name, "unknown package, nothing to bump");
            return;
        }

        info!(package = name, kind = %kind, "bumping package");

        let mut worklist: VecDeque<(String, BumpKind)> = VecDeque::new();
        let mut walked: HashSet<(String, String)> = HashSet::new();
        worklist.push_back((name.to_string(), kind));

        while let Some((current, kind)) = worklist.pop_front() {
            let (registry_name, staged) = match set.get_mut(&current) {
                Some(package) => {
                    package.bump(kind);
                    (
                        package.registry_name().to_string(),
                        package.staged_version().clone(),
                    )
                }
                None => continue,
            };

            for edge in self.graph.dependents_of(&current) {
                let dependent = match set.get_mut(&edge.dependent) {
                    Some(package) => package,
                    None => continue,
                };

                if dependent
                    .manifest_mut()
                    .pin_dependency(&registry_name, &staged)
                    .is_some()
                {
                    debug!(
                        package = %edge.dependent,
                        dependency = %registry_name,
                        section = %edge.kind,
                        version = %staged,
                        "dependency range pinned"
                    );
                }

                if walked.insert((current.clone(), edge.dependent.clone())) {
                    worklist.push_back((edge.dependent.clone(), BumpKind::Patch));
                }
            }
        }
    }
}
