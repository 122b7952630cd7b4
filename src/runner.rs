// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! External command execution for setup steps

use crate::types::EntryKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// Setup phase a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Generate migrations
    Generate,
    /// Apply migrations
    Migrate,
    /// Seed one schema
    Seed,
    /// Create one view
    View,
}

impl Phase {
    /// Entry kind the phase operates on, if any
    #[must_use]
    pub fn entry_kind(&self) -> Option<EntryKind> {
        match self {
            Self::Generate | Self::Migrate => None,
            Self::Seed => Some(EntryKind::Schema),
            Self::View => Some(EntryKind::View),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Migrate => "migrate",
            Self::Seed => "seed",
            Self::View => "view",
        })
    }
}

/// One external command in a setup plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Phase of the step
    pub phase: Phase,
    /// Entry the step works on, for per-entry phases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Rendered command line
    pub command: String,
}

impl Step {
    /// Build a step from a template, expanding `{name}` and `{kind}`
    #[must_use]
    pub fn render(phase: Phase, template: &str, entry: Option<&str>) -> Self {
        let mut command = template.to_string();
        if let Some(name) = entry {
            command = command.replace("{name}", name);
        }
        if let Some(kind) = phase.entry_kind() {
            command = command.replace("{kind}", kind.as_str());
        }

        Self {
            phase,
            entry: entry.map(str::to_string),
            command,
        }
    }

    /// Short label for logs and errors
    #[must_use]
    pub fn label(&self) -> String {
        match &self.entry {
            Some(name) => format!("{} {}", self.phase, name),
            None => self.phase.to_string(),
        }
    }
}

/// Errors from running a step
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The command could not be started
    #[error("Failed to start '{step}'")]
    Spawn {
        /// Step label
        step: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The command exited unsuccessfully
    #[error("Step '{step}' failed ({})", describe_exit(.code))]
    Failed {
        /// Step label
        step: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Something that can execute setup steps
pub trait CommandRunner {
    /// Execute one step, returning once it has finished
    fn run(&mut self, step: &Step) -> Result<(), RunnerError>;
}

/// Runs steps through the system shell, inheriting stdio
pub struct ShellRunner {
    working_dir: PathBuf,
}

impl ShellRunner {
    /// Create a runner executing commands in `working_dir`
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, step: &Step) -> Result<(), RunnerError> {
        tracing::info!("Running {}: {}", step.label(), step.command);

        let status = Self::shell_command(&step.command)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|source| RunnerError::Spawn {
                step: step.label(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::Failed {
                step: step.label(),
                code: status.code(),
            })
        }
    }
}

/// Prints steps instead of executing them
#[derive(Debug, Default)]
pub struct DryRunRunner {
    /// Steps seen so far
    pub steps: Vec<Step>,
    /// Suppress printing
    pub quiet: bool,
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, step: &Step) -> Result<(), RunnerError> {
        if !self.quiet {
            println!("[dry-run] {}: {}", step.label(), step.command);
        }
        self.steps.push(step.clone());
        Ok(())
    }
}
