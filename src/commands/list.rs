// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List command - show entries and their declared dependencies

use super::{print_json, Global};
use crate::types::EntryKind;
use anyhow::Result;
use owo_colors::Style;
use serde_json::json;

/// Run the list command
pub fn run(global: &Global) -> Result<()> {
    let settings = global.settings(None)?;

    if global.json {
        return print_json(&json!({
            "schemas": settings.schemas,
            "views": settings.views,
        }));
    }

    if let Some(source) = &settings.source {
        println!("Manifest: {}", source.display());
    }

    for kind in [EntryKind::Schema, EntryKind::View] {
        let entries = settings.entries(kind);
        println!();
        println!("{} ({}):", kind.plural(), entries.len());

        if entries.is_empty() {
            println!("  (none)");
            continue;
        }

        for entry in entries {
            print!("  {}", global.paint(&entry.name, Style::new().bold()));
            if let Some(desc) = &entry.description {
                print!(" - {desc}");
            }
            println!();
            if !entry.dependencies.is_empty() {
                println!("    depends on: {}", entry.dependencies.join(", "));
            }
        }
    }

    Ok(())
}
