// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph command - exports a dependency graph to various formats

use super::Global;
use crate::graph::DependencyGraph;
use crate::types::EntryKind;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown export format: {other}. Supported: dot, json")),
        }
    }
}

/// Run the graph command
pub fn run(
    global: &Global,
    kind: EntryKind,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    info!("Exporting {} graph as {:?}", kind, format);

    let settings = global.settings(None)?;
    let entries = settings.entries(kind);
    if entries.is_empty() {
        eprintln!("Warning: no {} defined in the manifest.", kind.plural());
    }

    let graph = DependencyGraph::from_entries(entries);
    let content = match format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => graph.to_json()?,
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
