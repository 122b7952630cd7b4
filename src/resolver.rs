// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency resolution for schema and view collections
//!
//! Two layers live here:
//!
//! - [`find_missing_dependencies`] and [`topological_order`] are permissive:
//!   they never fail, skip unknown names and do not detect cycles.
//! - [`DependencyResolver`] is strict: unknown names, incomplete selections
//!   and cycles are reported as [`ResolveError`]s.

use crate::types::{ConfigEntry, MissingDependency};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors produced by the strict resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A selected name has no entry in the collection
    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    /// An entry declares a dependency on a name absent from the collection
    #[error("{entry} depends on unknown entry {dependency}")]
    UnknownDependency {
        /// Entry declaring the dependency
        entry: String,
        /// The name that could not be found
        dependency: String,
    },

    /// Selected entries depend on entries that were not selected
    #[error("Missing dependencies: {}", format_missing(.0))]
    MissingDependencies(Vec<MissingDependency>),

    /// The selected entries depend on each other in a loop
    #[error("Cyclic dependency: {}", .path.join(" -> "))]
    Cycle {
        /// Names along the cycle; the first name is repeated at the end
        path: Vec<String>,
    },
}

fn format_missing(missing: &[MissingDependency]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Index entries by name, keeping the first occurrence of duplicates
fn index_by_name(collection: &[ConfigEntry]) -> HashMap<&str, &ConfigEntry> {
    let mut index = HashMap::with_capacity(collection.len());
    for entry in collection {
        index.entry(entry.name.as_str()).or_insert(entry);
    }
    index
}

// =============================================================================
// Permissive operations
// =============================================================================

/// List selected entries whose declared dependencies are not all selected.
///
/// Records come out in selection order and keep the declaration order of
/// the missing names. Selected names without an entry are skipped.
#[must_use]
pub fn find_missing_dependencies<S: AsRef<str>>(
    collection: &[ConfigEntry],
    selection: &[S],
) -> Vec<MissingDependency> {
    let index = index_by_name(collection);
    let selected: HashSet<&str> = selection.iter().map(AsRef::as_ref).collect();

    selection
        .iter()
        .filter_map(|name| {
            let entry = index.get(name.as_ref())?;
            let missing: Vec<String> = entry
                .dependencies
                .iter()
                .filter(|dep| !selected.contains(dep.as_str()))
                .cloned()
                .collect();

            if missing.is_empty() {
                None
            } else {
                Some(MissingDependency {
                    schema: name.as_ref().to_string(),
                    dependencies: missing,
                })
            }
        })
        .collect()
}

/// Order `selection` so each entry follows its selected dependencies.
///
/// Depth-first post-order driven by the selection order. A name is marked
/// visited before its dependencies are walked, so a cycle terminates and
/// yields some permutation instead of an error.
#[must_use]
pub fn topological_order<'a, S: AsRef<str>>(
    collection: &'a [ConfigEntry],
    selection: &'a [S],
) -> Vec<String> {
    let index = index_by_name(collection);
    let selected: HashSet<&str> = selection.iter().map(AsRef::as_ref).collect();
    let mut visited: HashSet<&'a str> = HashSet::with_capacity(selection.len());
    let mut ordered = Vec::with_capacity(selection.len());

    for name in selection {
        visit_permissive(name.as_ref(), &index, &selected, &mut visited, &mut ordered);
    }

    ordered
}

fn visit_permissive<'a>(
    name: &'a str,
    index: &HashMap<&'a str, &'a ConfigEntry>,
    selected: &HashSet<&str>,
    visited: &mut HashSet<&'a str>,
    ordered: &mut Vec<String>,
) {
    if !visited.insert(name) {
        return;
    }

    if let Some(&entry) = index.get(name) {
        for dep in &entry.dependencies {
            if selected.contains(dep.as_str()) {
                visit_permissive(dep, index, selected, visited, ordered);
            }
        }
    }

    ordered.push(name.to_string());
}

// =============================================================================
// Strict resolver
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Strict resolver over one collection
///
/// Builds a name index once; every lookup afterwards is O(1).
pub struct DependencyResolver<'a> {
    entries: &'a [ConfigEntry],
    index: HashMap<&'a str, &'a ConfigEntry>,
}

impl<'a> DependencyResolver<'a> {
    /// Index a collection for resolution
    #[must_use]
    pub fn new(entries: &'a [ConfigEntry]) -> Self {
        Self {
            entries,
            index: index_by_name(entries),
        }
    }

    /// Look up an entry by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a ConfigEntry> {
        self.index.get(name).copied()
    }

    /// Names of every entry, in collection order
    #[must_use]
    pub fn names(&self) -> Vec<&'a str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Check that every selected name exists, that every dependency of a
    /// selected entry exists, and that the selection is closed under
    /// dependencies.
    pub fn validate<S: AsRef<str>>(&self, selection: &[S]) -> Result<(), ResolveError> {
        for name in selection {
            let name = name.as_ref();
            let entry = self
                .get(name)
                .ok_or_else(|| ResolveError::UnknownEntry(name.to_string()))?;

            if let Some(dep) = entry
                .dependencies
                .iter()
                .find(|d| !self.index.contains_key(d.as_str()))
            {
                return Err(ResolveError::UnknownDependency {
                    entry: entry.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let missing = find_missing_dependencies(self.entries, selection);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ResolveError::MissingDependencies(missing))
        }
    }

    /// Validate `selection` and order it, failing on cycles.
    ///
    /// For acyclic input the result equals [`topological_order`].
    pub fn resolve<S: AsRef<str>>(&self, selection: &[S]) -> Result<Vec<String>, ResolveError> {
        self.validate(selection)?;

        let selected: HashSet<&str> = selection.iter().map(AsRef::as_ref).collect();
        let mut marks: HashMap<&'a str, Mark> = HashMap::with_capacity(selection.len());
        let mut stack: Vec<&'a str> = Vec::new();
        let mut ordered = Vec::with_capacity(selection.len());

        for name in selection {
            // validate() guarantees the key exists
            if let Some((&key, _)) = self.index.get_key_value(name.as_ref()) {
                self.visit(key, &selected, &mut marks, &mut stack, &mut ordered)?;
            }
        }

        tracing::debug!("Resolved order: {}", ordered.join(", "));
        Ok(ordered)
    }

    /// Resolve every entry of the collection
    pub fn resolve_all(&self) -> Result<Vec<String>, ResolveError> {
        self.resolve(&self.names())
    }

    fn visit(
        &self,
        name: &'a str,
        selected: &HashSet<&str>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        ordered: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut path: Vec<String> =
                    stack[start..].iter().map(|n| (*n).to_string()).collect();
                path.push(name.to_string());
                return Err(ResolveError::Cycle { path });
            }
            None => {}
        }

        marks.insert(name, Mark::InProgress);
        stack.push(name);

        if let Some(&entry) = self.index.get(name) {
            for dep in &entry.dependencies {
                if selected.contains(dep.as_str()) {
                    self.visit(dep, selected, marks, stack, ordered)?;
                }
            }
        }

        stack.pop();
        marks.insert(name, Mark::Done);
        ordered.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drinks() -> Vec<ConfigEntry> {
        vec![
            ConfigEntry::new("drink_types"),
            ConfigEntry::new("container_types"),
            ConfigEntry::new("drink_configs").depends_on(["drink_types", "container_types"]),
        ]
    }

    fn diamond() -> Vec<ConfigEntry> {
        vec![
            ConfigEntry::new("A"),
            ConfigEntry::new("B").depends_on(["A"]),
            ConfigEntry::new("C").depends_on(["A"]),
            ConfigEntry::new("D").depends_on(["B", "C"]),
        ]
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_complete_selection_has_no_missing() {
        let selection = ["drink_configs", "drink_types", "container_types"];
        assert!(find_missing_dependencies(&drinks(), &selection).is_empty());
    }

    #[test]
    fn test_drinks_order() {
        let selection = ["drink_configs", "drink_types", "container_types"];
        let order = topological_order(&drinks(), &selection);

        assert_eq!(order, vec!["drink_types", "container_types", "drink_configs"]);
    }

    #[test]
    fn test_missing_dependency_reported() {
        let missing = find_missing_dependencies(&drinks(), &["drink_configs"]);

        assert_eq!(
            missing,
            vec![MissingDependency {
                schema: "drink_configs".into(),
                dependencies: vec!["drink_types".into(), "container_types".into()],
            }]
        );
    }

    #[test]
    fn test_partially_missing_keeps_declaration_order() {
        let missing = find_missing_dependencies(&drinks(), &["drink_configs", "container_types"]);

        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].dependencies, vec!["drink_types"]);
    }

    #[test]
    fn test_unknown_selection_skipped_by_permissive_check() {
        let missing = find_missing_dependencies(&drinks(), &["nope", "drink_types"]);
        assert!(missing.is_empty());

        let order = topological_order(&drinks(), &["nope", "drink_types"]);
        assert_eq!(order, vec!["nope", "drink_types"]);
    }

    #[test]
    fn test_diamond_order() {
        let selection = ["D", "C", "B", "A"];
        let order = topological_order(&diamond(), &selection);

        assert_eq!(order.len(), 4);
        assert!(position(&order, "A") < position(&order, "B"));
        assert!(position(&order, "A") < position(&order, "C"));
        assert!(position(&order, "B") < position(&order, "D"));
        assert!(position(&order, "C") < position(&order, "D"));
    }

    #[test]
    fn test_cycle_terminates_in_permissive_order() {
        let entries = vec![
            ConfigEntry::new("X").depends_on(["Y"]),
            ConfigEntry::new("Y").depends_on(["X"]),
        ];
        let mut order = topological_order(&entries, &["X", "Y"]);
        order.sort();

        assert_eq!(order, vec!["X", "Y"]);
    }

    #[test]
    fn test_duplicate_selection_emitted_once() {
        let order = topological_order(&drinks(), &["drink_types", "drink_types"]);
        assert_eq!(order, vec!["drink_types"]);
    }

    #[test]
    fn test_unselected_dependency_not_added() {
        let order = topological_order(&drinks(), &["drink_configs"]);
        assert_eq!(order, vec!["drink_configs"]);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let entries = vec![
            ConfigEntry::new("a").depends_on(["b"]),
            ConfigEntry::new("a"),
            ConfigEntry::new("b"),
        ];
        let missing = find_missing_dependencies(&entries, &["a"]);

        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].dependencies, vec!["b"]);
    }

    #[test]
    fn test_strict_resolver_matches_permissive_on_acyclic_input() {
        let entries = diamond();
        let resolver = DependencyResolver::new(&entries);
        let selection = ["C", "D", "A", "B"];

        assert_eq!(
            resolver.resolve(&selection).unwrap(),
            topological_order(&entries, &selection)
        );
    }

    #[test]
    fn test_strict_resolver_detects_cycle() {
        let entries = vec![
            ConfigEntry::new("X").depends_on(["Y"]),
            ConfigEntry::new("Y").depends_on(["X"]),
        ];
        let err = DependencyResolver::new(&entries).resolve(&["X", "Y"]).unwrap_err();

        assert_eq!(
            err,
            ResolveError::Cycle {
                path: vec!["X".into(), "Y".into(), "X".into()]
            }
        );
        let message = err.to_string();
        assert!(message.contains('X') && message.contains('Y'));
    }

    #[test]
    fn test_strict_resolver_detects_self_loop() {
        let entries = vec![ConfigEntry::new("solo").depends_on(["solo"])];
        let err = DependencyResolver::new(&entries).resolve_all().unwrap_err();

        assert_eq!(
            err,
            ResolveError::Cycle {
                path: vec!["solo".into(), "solo".into()]
            }
        );
    }

    #[test]
    fn test_cycle_path_excludes_entry_prefix() {
        let entries = vec![
            ConfigEntry::new("root").depends_on(["p"]),
            ConfigEntry::new("p").depends_on(["q"]),
            ConfigEntry::new("q").depends_on(["p"]),
        ];
        let err = DependencyResolver::new(&entries).resolve_all().unwrap_err();

        assert_eq!(
            err,
            ResolveError::Cycle {
                path: vec!["p".into(), "q".into(), "p".into()]
            }
        );
    }

    #[test]
    fn test_strict_resolver_rejects_unknown_selection() {
        let entries = drinks();
        let err = DependencyResolver::new(&entries).resolve(&["ghost"]).unwrap_err();

        assert_eq!(err, ResolveError::UnknownEntry("ghost".into()));
    }

    #[test]
    fn test_strict_resolver_rejects_unknown_dependency() {
        let entries = vec![ConfigEntry::new("orders").depends_on(["customers"])];
        let err = DependencyResolver::new(&entries).resolve(&["orders"]).unwrap_err();

        assert_eq!(
            err,
            ResolveError::UnknownDependency {
                entry: "orders".into(),
                dependency: "customers".into(),
            }
        );
    }

    #[test]
    fn test_strict_resolver_rejects_missing() {
        let entries = drinks();
        let err = DependencyResolver::new(&entries).resolve(&["drink_configs"]).unwrap_err();

        match err {
            ResolveError::MissingDependencies(missing) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].schema, "drink_configs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_all_uses_collection() {
        let entries = drinks();
        let order = DependencyResolver::new(&entries).resolve_all().unwrap();

        assert_eq!(order, vec!["drink_types", "container_types", "drink_configs"]);
    }

    #[test]
    fn test_empty_selection() {
        let entries = drinks();
        let empty: [&str; 0] = [];

        assert!(topological_order(&entries, &empty).is_empty());
        assert!(DependencyResolver::new(&entries).resolve(&empty).unwrap().is_empty());
    }
}
