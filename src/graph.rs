// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency graph view of a collection, for export and cycle analysis

use crate::types::ConfigEntry;
use anyhow::{Context, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Edge in exported graph form: `from` must run before `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// The dependency
    pub from: String,
    /// The dependent entry
    pub to: String,
}

#[derive(Serialize)]
struct GraphExport<'a> {
    nodes: Vec<&'a str>,
    edges: Vec<GraphEdge>,
}

/// Collection graph with petgraph backing for algorithms
pub struct DependencyGraph<'a> {
    /// Edges point from dependency to dependent
    graph: DiGraph<&'a str, ()>,
    /// Map from entry name to node index
    node_indices: HashMap<&'a str, NodeIndex>,
    /// Declared dependencies that name no entry
    unknown: Vec<(&'a str, &'a str)>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph for a collection
    #[must_use]
    pub fn from_entries(entries: &'a [ConfigEntry]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::with_capacity(entries.len());

        for entry in entries {
            node_indices
                .entry(entry.name.as_str())
                .or_insert_with(|| graph.add_node(entry.name.as_str()));
        }

        // Later duplicates are shadowed by the entry that claimed the node
        let mut seen = HashSet::with_capacity(entries.len());
        let mut unknown = Vec::new();
        for entry in entries {
            if !seen.insert(entry.name.as_str()) {
                continue;
            }
            let to = node_indices[entry.name.as_str()];
            for dep in &entry.dependencies {
                match node_indices.get(dep.as_str()) {
                    Some(&from) => {
                        graph.update_edge(from, to, ());
                    }
                    None => unknown.push((entry.name.as_str(), dep.as_str())),
                }
            }
        }

        Self {
            graph,
            node_indices,
            unknown,
        }
    }

    /// Number of distinct entries
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of known dependency edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a name is part of the graph
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    /// All edges in insertion order
    #[must_use]
    pub fn edges(&self) -> Vec<GraphEdge> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| GraphEdge {
                from: self.graph[e.source()].to_string(),
                to: self.graph[e.target()].to_string(),
            })
            .collect()
    }

    /// Groups of entries that depend on each other in a loop.
    ///
    /// Each group is sorted by name; the groups themselves are sorted too.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.iter().map(|&idx| self.graph[idx].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Dependencies naming entries that do not exist, as `(entry, dependency)`
    #[must_use]
    pub fn unknown_references(&self) -> &[(&'a str, &'a str)] {
        &self.unknown
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph dependencies {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for idx in self.graph.node_indices() {
            dot.push_str(&format!("  \"{}\";\n", escape(self.graph[idx])));
        }

        dot.push('\n');

        for edge in self.edges() {
            dot.push_str(&format!("  \"{}\" -> \"{}\";\n", escape(&edge.from), escape(&edge.to)));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        let export = GraphExport {
            nodes: self.graph.node_indices().map(|idx| self.graph[idx]).collect(),
            edges: self.edges(),
        };
        serde_json::to_string_pretty(&export)
            .context("Failed to serialize dependency graph to JSON")
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
