// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Order command - print the resolved seeding order

use super::{print_json, Global, SelectArgs};
use crate::orchestrator::{self, OrchestratorError};
use crate::types::EntryKind;
use anyhow::Result;
use owo_colors::Style;

/// Run the order command
pub fn run(global: &Global, select: SelectArgs) -> Result<()> {
    let settings = global.settings(None)?;
    let selection = select.selection_or_all();

    let order = match orchestrator::resolve(&settings, &selection) {
        Ok(order) => order,
        Err(OrchestratorError::Incomplete(report)) => {
            if global.json {
                print_json(&report)?;
            }
            return Err(OrchestratorError::Incomplete(report).into());
        }
        Err(err) => return Err(err.into()),
    };

    if global.json {
        return print_json(&order);
    }

    for (kind, names) in [(EntryKind::Schema, &order.schemas), (EntryKind::View, &order.views)] {
        if names.is_empty() {
            continue;
        }
        println!("{} ({}):", kind.plural(), names.len());
        for (i, name) in names.iter().enumerate() {
            println!("  {}. {}", i + 1, global.paint(name, Style::new().bold()));
        }
    }

    Ok(())
}
