// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod check;
pub mod completions;
pub mod graph;
pub mod list;
pub mod order;
pub mod run;

use crate::config::{self, Settings};
use crate::orchestrator::{Selection, SelectionSet};
use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use std::path::PathBuf;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Global {
    /// Manifest path override
    pub config: Option<PathBuf>,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl Global {
    /// Load settings from the configured or discovered manifest
    pub fn settings(&self, environment: Option<&str>) -> Result<Settings> {
        config::load(self.config.as_deref(), environment)
    }

    /// Apply a style when color is enabled
    #[must_use]
    pub fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Entry selection flags shared by `check`, `order` and `run`
#[derive(Debug, Clone, Default)]
pub struct SelectArgs {
    /// Schema names
    pub schemas: Vec<String>,
    /// View names
    pub views: Vec<String>,
    /// Select every entry of kinds without explicit names
    pub all: bool,
}

impl SelectArgs {
    /// Build the selection set
    #[must_use]
    pub fn selection(self) -> SelectionSet {
        SelectionSet {
            schemas: Selection::from_args(self.schemas, self.all),
            views: Selection::from_args(self.views, self.all),
        }
    }

    /// Like [`SelectArgs::selection`], but nothing given means everything
    #[must_use]
    pub fn selection_or_all(self) -> SelectionSet {
        if self.schemas.is_empty() && self.views.is_empty() {
            SelectionSet::all()
        } else {
            self.selection()
        }
    }
}

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
