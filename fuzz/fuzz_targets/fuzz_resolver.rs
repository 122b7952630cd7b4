// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use arbitrary::Arbitrary;
use dbsetup::resolver::{
    find_missing_dependencies, topological_order, DependencyResolver, ResolveError,
};
use dbsetup::types::ConfigEntry;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    /// Dependency indices per entry, taken modulo the entry count
    edges: Vec<Vec<u8>>,
    selection: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let n = input.edges.len().min(32);
    if n == 0 {
        return;
    }

    let entries: Vec<ConfigEntry> = input.edges[..n]
        .iter()
        .enumerate()
        .map(|(i, deps)| {
            ConfigEntry::new(format!("e{i}"))
                .depends_on(deps.iter().map(|d| format!("e{}", usize::from(*d) % n)))
        })
        .collect();
    let selection: Vec<String> = input
        .selection
        .iter()
        .map(|s| format!("e{}", usize::from(*s) % n))
        .collect();

    // Permissive ordering never drops or invents names
    let order = topological_order(&entries, &selection);
    let mut unique = selection.clone();
    unique.sort();
    unique.dedup();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(sorted, unique);

    let missing = find_missing_dependencies(&entries, &selection);
    match DependencyResolver::new(&entries).resolve(&selection) {
        Ok(strict) => {
            assert!(missing.is_empty());
            assert_eq!(strict, order);
        }
        Err(ResolveError::MissingDependencies(reported)) => assert_eq!(reported, missing),
        Err(ResolveError::Cycle { path }) => {
            assert!(missing.is_empty());
            assert_eq!(path.first(), path.last());
        }
        Err(err) => panic!("unexpected error: {err}"),
    }
});
