// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Manifest and settings loading
//!
//! Settings are layered: the manifest file (TOML or JSON, chosen by
//! extension), then `DBSETUP_*` environment variables, then CLI overrides.
//! Nested keys use `__` in variable names, e.g. `DBSETUP_COMMANDS__SEED`.

use crate::types::{ConfigEntry, EntryKind};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest names looked up in the working directory
pub const DEFAULT_MANIFESTS: &[&str] = &["dbsetup.toml", "dbsetup.json"];

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DBSETUP";

/// Command line templates for each setup phase.
///
/// `{name}` expands to the entry name and `{kind}` to `schema` or `view`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplates {
    /// Generate migrations from schema definitions
    pub generate: Option<String>,
    /// Apply pending migrations
    pub migrate: Option<String>,
    /// Seed one schema
    pub seed: Option<String>,
    /// Create one view
    pub view: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Environment name, selects `.env.<environment>`
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Explicit dotenv file, relative to the manifest directory
    #[serde(default)]
    pub env_file: Option<PathBuf>,
    /// Schema entries, seeded in dependency order
    #[serde(default)]
    pub schemas: Vec<ConfigEntry>,
    /// View entries, created in dependency order after seeding
    #[serde(default)]
    pub views: Vec<ConfigEntry>,
    /// Command templates
    #[serde(default)]
    pub commands: CommandTemplates,
    /// Manifest the settings were read from (runtime, not persisted)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            env_file: None,
            schemas: Vec::new(),
            views: Vec::new(),
            commands: CommandTemplates::default(),
            source: None,
        }
    }
}

impl Settings {
    /// Entries of one kind
    #[must_use]
    pub fn entries(&self, kind: EntryKind) -> &[ConfigEntry] {
        match kind {
            EntryKind::Schema => &self.schemas,
            EntryKind::View => &self.views,
        }
    }

    /// Directory relative paths are resolved against
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Path of the dotenv file for the current environment
    #[must_use]
    pub fn env_file_path(&self) -> PathBuf {
        let file = self
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!(".env.{}", self.environment)));
        if file.is_absolute() {
            file
        } else {
            self.base_dir().join(file)
        }
    }

    /// Load the dotenv file into the process environment if it exists.
    ///
    /// Variables already set are kept. Returns the file that was loaded.
    pub fn load_env_file(&self) -> Result<Option<PathBuf>> {
        let path = self.env_file_path();
        if !path.exists() {
            tracing::debug!("No env file at {}", path.display());
            return Ok(None);
        }

        dotenvy::from_path(&path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
        tracing::info!("Loaded environment from {}", path.display());
        Ok(Some(path))
    }
}

/// Find the manifest to use when none was given on the command line
#[must_use]
pub fn discover_manifest(dir: &Path) -> Option<PathBuf> {
    DEFAULT_MANIFESTS
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .or_else(user_manifest)
}

/// Per-user manifest in the platform config directory
fn user_manifest() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "dbsetup")
        .map(|dirs| dirs.config_dir().join(DEFAULT_MANIFESTS[0]))
        .filter(|p| p.is_file())
}

/// Load settings from an explicit manifest, or discover one
pub fn load(manifest: Option<&Path>, environment: Option<&str>) -> Result<Settings> {
    let source = match manifest {
        Some(path) => {
            if !path.is_file() {
                bail!("Manifest not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            discover_manifest(&cwd)
        }
    };

    let mut builder = config::Config::builder();
    match &source {
        Some(path) => {
            tracing::debug!("Reading manifest {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }
        None => tracing::warn!("No manifest found, using empty collections"),
    }

    let built = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("environment", environment.map(str::to_string))
        .context("Failed to apply environment override")?
        .build()
        .with_context(|| match &source {
            Some(path) => format!("Failed to read {}", path.display()),
            None => "Failed to read settings from environment".to_string(),
        })?;

    let mut settings: Settings = built
        .try_deserialize()
        .context("Manifest has an invalid shape")?;
    settings.source = source;

    tracing::debug!(
        "Loaded {} schemas and {} views",
        settings.schemas.len(),
        settings.views.len()
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOML_MANIFEST: &str = r#"
environment = "test"

[commands]
seed = "echo seed {name}"

[[schemas]]
name = "drink_types"
description = "Base drink catalogue"

[[schemas]]
name = "drink_configs"
dependencies = ["drink_types"]

[[views]]
name = "drink_summary"
"#;

    #[test]
    fn test_load_toml_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dbsetup.toml");
        std::fs::write(&path, TOML_MANIFEST).unwrap();

        let settings = load(Some(&path), None).unwrap();

        assert_eq!(settings.schemas.len(), 2);
        assert_eq!(settings.schemas[1].dependencies, vec!["drink_types"]);
        assert_eq!(settings.schemas[0].description.as_deref(), Some("Base drink catalogue"));
        assert_eq!(settings.views[0].name, "drink_summary");
        assert_eq!(settings.commands.seed.as_deref(), Some("echo seed {name}"));
        assert!(settings.commands.migrate.is_none());
        assert_eq!(settings.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_json_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dbsetup.json");
        std::fs::write(
            &path,
            r#"{"schemas": [{"name": "a"}, {"name": "b", "dependencies": ["a"]}]}"#,
        )
        .unwrap();

        let settings = load(Some(&path), None).unwrap();

        assert_eq!(settings.entries(EntryKind::Schema).len(), 2);
        assert!(settings.entries(EntryKind::View).is_empty());
    }

    #[test]
    fn test_environment_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dbsetup.toml");
        std::fs::write(&path, TOML_MANIFEST).unwrap();

        let settings = load(Some(&path), Some("production")).unwrap();

        assert_eq!(settings.environment, "production");
        assert_eq!(settings.env_file_path(), dir.path().join(".env.production"));
    }

    #[test]
    fn test_missing_explicit_manifest() {
        let dir = TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("nope.toml")), None).unwrap_err();

        assert!(err.to_string().contains("Manifest not found"));
    }

    #[test]
    fn test_discover_manifest_in_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dbsetup.json"), "{}").unwrap();

        assert_eq!(discover_manifest(dir.path()), Some(dir.path().join("dbsetup.json")));
    }

    #[test]
    fn test_env_file_path_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.env_file_path(), PathBuf::from("./.env.development"));
    }

    #[test]
    fn test_load_env_file_absent() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            source: Some(dir.path().join("dbsetup.toml")),
            ..Settings::default()
        };

        assert!(settings.load_env_file().unwrap().is_none());
    }
}
