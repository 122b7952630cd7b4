// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check command - validate a selection without running anything

use super::{print_json, Global, SelectArgs};
use crate::graph::DependencyGraph;
use crate::orchestrator::{check_selection, ValidationReport};
use crate::resolver::DependencyResolver;
use crate::types::EntryKind;
use anyhow::{bail, Result};
use owo_colors::Style;
use serde::Serialize;

/// Problems found in one collection
#[derive(Debug, Default, Serialize)]
struct KindFindings {
    /// Unknown names or cycles within the selection
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Cycles anywhere in the collection
    cycles: Vec<Vec<String>>,
    /// Dependencies naming nothing, as `entry -> dependency`
    unknown_references: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    ok: bool,
    missing: ValidationReport,
    schemas: KindFindings,
    views: KindFindings,
}

/// Run the check command
pub fn run(global: &Global, select: SelectArgs) -> Result<()> {
    let settings = global.settings(None)?;
    let selection = select.selection_or_all();

    let missing = check_selection(&settings, &selection);

    let findings = |kind: EntryKind| {
        let entries = settings.entries(kind);
        let graph = DependencyGraph::from_entries(entries);
        let names = selection.get(kind).names(entries);

        // Missing dependencies are reported separately
        let error = match DependencyResolver::new(entries).resolve(&names) {
            Ok(_) | Err(crate::resolver::ResolveError::MissingDependencies(_)) => None,
            Err(err) => Some(err.to_string()),
        };

        KindFindings {
            error,
            cycles: graph.cycles(),
            unknown_references: graph
                .unknown_references()
                .iter()
                .map(|(entry, dep)| format!("{entry} -> {dep}"))
                .collect(),
        }
    };

    let schemas = findings(EntryKind::Schema);
    let views = findings(EntryKind::View);
    let report = CheckReport {
        ok: missing.is_empty() && schemas.error.is_none() && views.error.is_none(),
        missing,
        schemas,
        views,
    };

    if global.json {
        print_json(&report)?;
    } else {
        print_report(global, &report);
    }

    if !report.ok {
        bail!("Selection check failed");
    }
    Ok(())
}

fn print_report(global: &Global, report: &CheckReport) {
    let bad = Style::new().red().bold();
    let warn = Style::new().yellow();

    if report.missing.is_empty() {
        println!("{}", global.paint("No missing dependencies.", Style::new().green()));
    } else {
        println!("{}", global.paint("Missing dependencies:", bad));
        print!("{}", report.missing);
    }

    for (kind, findings) in [
        (EntryKind::Schema, &report.schemas),
        (EntryKind::View, &report.views),
    ] {
        if let Some(err) = &findings.error {
            println!("{} {}", global.paint(&format!("{kind}:"), bad), err);
        }
        for cycle in &findings.cycles {
            println!(
                "{} cycle among {}",
                global.paint(&format!("warning ({kind}):"), warn),
                cycle.join(", ")
            );
        }
        for reference in &findings.unknown_references {
            println!(
                "{} unknown dependency {}",
                global.paint(&format!("warning ({kind}):"), warn),
                reference
            );
        }
    }

    if report.ok {
        println!("Selection is valid.");
    }
}
