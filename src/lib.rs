// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! dbsetup library - dependency-ordered database setup
//!
//! This crate resolves the order in which database schemas and views
//! must be seeded, validates user selections against declared
//! dependencies, and runs one external command per entry in that order.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod graph;
pub mod orchestrator;
pub mod resolver;
pub mod runner;

/// Core data types shared by the resolver, the graph and the CLI
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    // =========================================================================
    // Config Entries
    // =========================================================================

    /// A named unit of setup work (a schema or a view)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConfigEntry {
        /// Unique identifier within its collection
        pub name: String,
        /// Human-readable description, no effect on ordering
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// Names of entries that must be processed first
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub dependencies: Vec<String>,
    }

    impl ConfigEntry {
        /// Create an entry with no description and no dependencies
        #[must_use]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                description: None,
                dependencies: Vec::new(),
            }
        }

        /// Builder-style helper to declare dependencies
        #[must_use]
        pub fn depends_on<I, S>(mut self, deps: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.dependencies.extend(deps.into_iter().map(Into::into));
            self
        }

        /// Builder-style helper to set the description
        #[must_use]
        pub fn with_description(mut self, description: impl Into<String>) -> Self {
            self.description = Some(description.into());
            self
        }
    }

    /// A selected entry whose dependencies are not all selected
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MissingDependency {
        /// The selected entry
        pub schema: String,
        /// Its declared dependencies that are absent from the selection
        pub dependencies: Vec<String>,
    }

    impl fmt::Display for MissingDependency {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} requires {}", self.schema, self.dependencies.join(", "))
        }
    }

    // =========================================================================
    // Entry Kinds
    // =========================================================================

    /// Which collection an entry belongs to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EntryKind {
        /// Database schema, seeded after migrations
        Schema,
        /// Database view, created after all seeding
        View,
    }

    impl EntryKind {
        /// Lowercase name used in templates and output
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Schema => "schema",
                Self::View => "view",
            }
        }

        /// Plural form for headings
        #[must_use]
        pub fn plural(&self) -> &'static str {
            match self {
                Self::Schema => "schemas",
                Self::View => "views",
            }
        }
    }

    impl fmt::Display for EntryKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl std::str::FromStr for EntryKind {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "schema" | "schemas" => Ok(Self::Schema),
                "view" | "views" => Ok(Self::View),
                other => Err(format!("Unknown entry kind: {other}. Valid: schema, view")),
            }
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::resolver::{
        find_missing_dependencies, topological_order, DependencyResolver, ResolveError,
    };
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
