// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Setup orchestration: selection, validation gate, plan, execution
//!
//! Nothing reaches the [`CommandRunner`] until both collections pass
//! validation. Steps then run one at a time and the first failure stops
//! the sequence.

use crate::config::Settings;
use crate::resolver::{find_missing_dependencies, DependencyResolver, ResolveError};
use crate::runner::{CommandRunner, Phase, Step};
use crate::types::{ConfigEntry, EntryKind, MissingDependency};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use thiserror::Error;

// =============================================================================
// Selection
// =============================================================================

/// How entries of one kind were chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every entry of the collection, in collection order
    All,
    /// Explicit names, in the order given
    Names(Vec<String>),
}

impl Selection {
    /// Explicit names win; otherwise `all` selects everything
    #[must_use]
    pub fn from_args(names: Vec<String>, all: bool) -> Self {
        if names.is_empty() && all {
            Self::All
        } else {
            Self::Names(names)
        }
    }

    /// Whether this selects nothing by construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Names(names) if names.is_empty())
    }

    /// Expand to concrete names against a collection
    #[must_use]
    pub fn names(&self, entries: &[ConfigEntry]) -> Vec<String> {
        match self {
            Self::All => entries.iter().map(|e| e.name.clone()).collect(),
            Self::Names(names) => names.clone(),
        }
    }
}

/// Selections for both collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    /// Schema selection
    pub schemas: Selection,
    /// View selection
    pub views: Selection,
}

impl SelectionSet {
    /// Select everything in both collections
    #[must_use]
    pub fn all() -> Self {
        Self {
            schemas: Selection::All,
            views: Selection::All,
        }
    }

    /// Whether neither collection has anything selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.views.is_empty()
    }

    /// Selection for one kind
    #[must_use]
    pub fn get(&self, kind: EntryKind) -> &Selection {
        match kind {
            EntryKind::Schema => &self.schemas,
            EntryKind::View => &self.views,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Missing dependencies for both collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Schemas with unselected dependencies
    pub schemas: Vec<MissingDependency>,
    /// Views with unselected dependencies
    pub views: Vec<MissingDependency>,
}

impl ValidationReport {
    /// True when nothing is missing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.views.is_empty()
    }

    /// Records for one kind
    #[must_use]
    pub fn get(&self, kind: EntryKind) -> &[MissingDependency] {
        match kind {
            EntryKind::Schema => &self.schemas,
            EntryKind::View => &self.views,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in [EntryKind::Schema, EntryKind::View] {
            for missing in self.get(kind) {
                writeln!(f, "  {kind} {missing}")?;
            }
        }
        Ok(())
    }
}

/// Errors that stop a run before any command executes
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Selected entries depend on unselected ones
    #[error("Selection is missing dependencies:\n{0}")]
    Incomplete(ValidationReport),

    /// Strict resolution failed (unknown name or cycle)
    #[error("Failed to resolve {kind} order")]
    Resolve {
        /// Collection that failed
        kind: EntryKind,
        /// Resolver error
        #[source]
        source: ResolveError,
    },
}

/// Run the missing-dependency check on both collections
#[must_use]
pub fn check_selection(settings: &Settings, selection: &SelectionSet) -> ValidationReport {
    let check = |kind: EntryKind| {
        let entries = settings.entries(kind);
        find_missing_dependencies(entries, &selection.get(kind).names(entries))
    };

    ValidationReport {
        schemas: check(EntryKind::Schema),
        views: check(EntryKind::View),
    }
}

/// Resolved execution order for both collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedOrder {
    /// Schemas in seeding order
    pub schemas: Vec<String>,
    /// Views in creation order
    pub views: Vec<String>,
}

/// Validate both selections, then order them strictly
pub fn resolve(
    settings: &Settings,
    selection: &SelectionSet,
) -> Result<ResolvedOrder, OrchestratorError> {
    let report = check_selection(settings, selection);
    if !report.is_empty() {
        return Err(OrchestratorError::Incomplete(report));
    }

    let order = |kind: EntryKind| {
        let entries = settings.entries(kind);
        DependencyResolver::new(entries)
            .resolve(&selection.get(kind).names(entries))
            .map_err(|source| OrchestratorError::Resolve { kind, source })
    };

    Ok(ResolvedOrder {
        schemas: order(EntryKind::Schema)?,
        views: order(EntryKind::View)?,
    })
}

// =============================================================================
// Plan
// =============================================================================

/// Which phases to include in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Generate and apply migrations first
    pub migrations: bool,
    /// Seed schemas
    pub seed: bool,
    /// Create views
    pub views: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            migrations: true,
            seed: true,
            views: true,
        }
    }
}

/// Turn a resolved order into the sequence of commands to run
#[must_use]
pub fn build_plan(settings: &Settings, order: &ResolvedOrder, options: PlanOptions) -> Vec<Step> {
    let commands = &settings.commands;
    let mut plan = Vec::new();

    if options.migrations {
        for (phase, template) in [
            (Phase::Generate, &commands.generate),
            (Phase::Migrate, &commands.migrate),
        ] {
            match template {
                Some(t) => plan.push(Step::render(phase, t, None)),
                None => tracing::warn!("No {} command configured, skipping", phase),
            }
        }
    }

    let per_entry = [
        (options.seed, Phase::Seed, &commands.seed, &order.schemas),
        (options.views, Phase::View, &commands.view, &order.views),
    ];
    for (enabled, phase, template, names) in per_entry {
        if !enabled || names.is_empty() {
            continue;
        }
        match template {
            Some(t) => plan.extend(
                names
                    .iter()
                    .map(|name| Step::render(phase, t, Some(name.as_str()))),
            ),
            None => tracing::warn!(
                "No {} command configured, skipping {} entries",
                phase,
                names.len()
            ),
        }
    }

    plan
}

// =============================================================================
// Execution
// =============================================================================

/// Outcome of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Exited successfully
    Succeeded,
    /// Failed; no later step ran
    Failed,
}

/// One executed step with timing
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// The step
    #[serde(flatten)]
    pub step: Step,
    /// Outcome
    pub status: StepStatus,
    /// When the step started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Report of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Executed steps, in order
    pub steps: Vec<StepRecord>,
    /// Steps never started because an earlier one failed
    pub not_run: Vec<Step>,
    /// Failure message, if any step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// True when every planned step succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Execute steps sequentially, stopping at the first failure
pub fn execute(plan: &[Step], runner: &mut dyn CommandRunner) -> RunReport {
    let mut report = RunReport {
        started_at: Utc::now(),
        steps: Vec::with_capacity(plan.len()),
        not_run: Vec::new(),
        error: None,
    };

    for (i, step) in plan.iter().enumerate() {
        let started_at = Utc::now();
        let clock = Instant::now();
        let result = runner.run(step);
        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = if result.is_ok() { StepStatus::Succeeded } else { StepStatus::Failed };
        report.steps.push(StepRecord {
            step: step.clone(),
            status,
            started_at,
            duration_ms,
        });

        if let Err(err) = result {
            tracing::error!("{}", err);
            report.error = Some(err.to_string());
            report.not_run = plan[i + 1..].to_vec();
            break;
        }
        tracing::debug!("{} finished in {} ms", step.label(), duration_ms);
    }

    report
}

/// Ties settings and a runner together for a full setup run
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    runner: &'a mut dyn CommandRunner,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator
    pub fn new(settings: &'a Settings, runner: &'a mut dyn CommandRunner) -> Self {
        Self { settings, runner }
    }

    /// Validate, plan and execute.
    ///
    /// Validation errors return before the runner is touched. A failing
    /// step is reported in the returned [`RunReport`].
    pub fn run(
        &mut self,
        selection: &SelectionSet,
        options: PlanOptions,
    ) -> Result<RunReport, OrchestratorError> {
        let order = resolve(self.settings, selection)?;
        tracing::info!(
            "Resolved {} schemas and {} views",
            order.schemas.len(),
            order.views.len()
        );

        let plan = build_plan(self.settings, &order, options);
        Ok(execute(&plan, &mut *self.runner))
    }
}
