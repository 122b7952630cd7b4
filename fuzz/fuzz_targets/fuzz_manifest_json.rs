// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use dbsetup::graph::DependencyGraph;
use dbsetup::types::ConfigEntry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(entries) = serde_json::from_slice::<Vec<ConfigEntry>>(data) {
        let graph = DependencyGraph::from_entries(&entries);
        let _ = graph.to_dot();
        let _ = graph.cycles();
        let _ = graph.to_json();
    }
});
