//! Internal dependency graph over a package set

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::manifest::DependencyKind;
use crate::package::PackageSet;

/// An edge from a package to one of its dependents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Directory name of the depending package
    pub dependent: String,
    /// Which manifest section declares the dependency
    pub kind: DependencyKind,
}

/// Directed graph of internal dependencies, keyed by directory name.
///
/// Edges point from a package to the packages that depend on it, held in set
/// order so a propagation wave visits dependents the same way a scan over
/// the package list would. Dependency matching goes through registry names,
/// since that is what manifests reference.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    dependents: HashMap<String, Vec<DependencyEdge>>,
}

impl DependencyGraph {
    /// Build the graph from a package set
    pub fn build(set: &PackageSet) -> Self {
        let mut graph = Self {
            names: set.names().to_vec(),
            dependents: HashMap::new(),
        };

        for package in set.iter() {
            for dependent in set.iter() {
                if dependent.name() == package.name() {
                    continue;
                }
                if let Some(kind) = dependent
                    .manifest()
                    .dependency_kind_of(package.registry_name())
                {
                    graph
                        .dependents
                        .entry(package.name().to_string())
                        .or_default()
                        .push(DependencyEdge {
                            dependent: dependent.name().to_string(),
                            kind,
                        });
                }
            }
        }

        debug!(
            packages = graph.names.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        if let Some(members) = graph.cycle_members() {
            warn!(
                members = %members.join(", "),
                "dependency cycle detected, propagation will stop at a fixed point"
            );
        }
        graph
    }

    /// Packages that depend on `name`, in set order
    pub fn dependents_of(&self, name: &str) -> &[DependencyEdge] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }

    /// Whether the graph contains at least one dependency cycle
    pub fn has_cycle(&self) -> bool {
        self.cycle_members().is_some()
    }

    /// Kahn's algorithm: names that survive repeated removal of
    /// zero-in-degree nodes are part of, or downstream of, a cycle
    fn cycle_members(&self) -> Option<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> =
            self.names.iter().map(|name| (name.as_str(), 0)).collect();
        for edges in self.dependents.values() {
            for edge in edges {
                if let Some(count) = in_degree.get_mut(edge.dependent.as_str()) {
                    *count += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut removed: HashSet<&str> = HashSet::new();

        while let Some(name) = queue.pop_front() {
            removed.insert(name);
            for edge in self.dependents_of(name) {
                if let Some(count) = in_degree.get_mut(edge.dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(edge.dependent.as_str());
                    }
                }
            }
        }

        if removed.len() == self.names.len() {
            None
        } else {
            Some(
                self.names
                    .iter()
                    .filter(|name| !removed.contains(name.as_str()))
                    .cloned()
                    .collect(),
            )
        }
    }
}
