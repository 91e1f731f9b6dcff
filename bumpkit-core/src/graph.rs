//! Workspace dependency graph using petgraph.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::package::PackageInfo;

/// Directed graph of intra-workspace dependencies.
///
/// Edges point from a package to the packages it depends on. Cycles are
/// tolerated: dev-dependency loops are common in real workspaces and do not
/// prevent a release.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph. Dependencies on packages outside `packages` are ignored.
    pub fn new(packages: &[PackageInfo]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for package in packages {
            let node = graph.add_node(package.name.clone());
            node_map.insert(package.name.clone(), node);
        }

        for package in packages {
            let from_node = node_map[&package.name];
            for dep_name in package.dependencies.keys() {
                if let Some(&to_node) = node_map.get(dep_name) {
                    graph.add_edge(from_node, to_node, ());
                }
            }
        }

        Self { graph, node_map }
    }

    /// Returns direct dependencies of a package. Unknown names have none.
    pub fn dependencies(&self, package_name: &str) -> Vec<&str> {
        self.neighbors(package_name, Direction::Outgoing)
    }

    /// Returns direct dependents of a package (packages that depend on it).
    pub fn dependents(&self, package_name: &str) -> Vec<&str> {
        self.neighbors(package_name, Direction::Incoming)
    }

    /// Returns every package with its dependencies ahead of it.
    ///
    /// Members of a cycle come out together in name order.
    pub fn dependencies_first(&self) -> Vec<&str> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .flat_map(|component| {
                let mut names: Vec<&str> = component
                    .into_iter()
                    .map(|idx| self.graph[idx].as_str())
                    .collect();
                names.sort_unstable();
                names
            })
            .collect()
    }

    fn neighbors(&self, package_name: &str, direction: Direction) -> Vec<&str> {
        let Some(&node) = self.node_map.get(package_name) else {
            return Vec::new();
        };

        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|idx| self.graph[idx].as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
