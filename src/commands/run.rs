// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Run command - migrate, seed and create views in dependency order

use super::{print_json, Global, SelectArgs};
use crate::orchestrator::{Orchestrator, OrchestratorError, PlanOptions, RunReport, StepStatus};
use crate::runner::{CommandRunner, DryRunRunner, ShellRunner};
use anyhow::{bail, Context, Result};
use owo_colors::Style;

/// Arguments for the run command
pub struct RunArgs {
    /// Entry selection
    pub select: SelectArgs,
    /// Print the plan instead of executing it
    pub dry_run: bool,
    /// Environment name override
    pub environment: Option<String>,
    /// Phases to run
    pub options: PlanOptions,
}

/// Run the setup sequence
pub fn run(global: &Global, args: RunArgs) -> Result<()> {
    let settings = global.settings(args.environment.as_deref())?;

    let selection = args.select.selection();
    if selection.is_empty() {
        bail!("Nothing selected. Pass --schema/--view names, or --yes to select everything");
    }

    settings.load_env_file()?;
    tracing::info!("Environment: {}", settings.environment);

    let mut dry = DryRunRunner {
        quiet: global.json,
        ..Default::default()
    };
    let mut shell = ShellRunner::new(settings.base_dir());
    let runner: &mut dyn CommandRunner = if args.dry_run { &mut dry } else { &mut shell };

    let report = match Orchestrator::new(&settings, runner).run(&selection, args.options) {
        Ok(report) => report,
        Err(OrchestratorError::Incomplete(missing)) => {
            if global.json {
                print_json(&missing)?;
            } else {
                eprintln!("{}", global.paint("Missing dependencies:", Style::new().red().bold()));
                eprint!("{missing}");
            }
            bail!("Selection is incomplete; select the missing entries and retry");
        }
        Err(err) => return Err(err).context("Setup aborted before running any command"),
    };

    if global.json {
        print_json(&report)?;
    } else {
        print_summary(global, &report, args.dry_run);
    }

    match &report.error {
        Some(err) => bail!("Setup failed: {err}"),
        None => Ok(()),
    }
}

fn print_summary(global: &Global, report: &RunReport, dry_run: bool) {
    if report.steps.is_empty() {
        println!("Nothing to run.");
        return;
    }

    let verb = if dry_run { "Planned" } else { "Ran" };
    println!();
    println!("{} {} step(s):", verb, report.steps.len());

    for record in &report.steps {
        let mark = match record.status {
            StepStatus::Succeeded => global.paint("ok", Style::new().green()),
            StepStatus::Failed => global.paint("FAILED", Style::new().red().bold()),
        };
        println!("  [{}] {} ({} ms)", mark, record.step.label(), record.duration_ms);
    }

    if !report.not_run.is_empty() {
        println!("Not run:");
        for step in &report.not_run {
            println!("  {}", step.label());
        }
    }
}
