// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! dbsetup CLI - dependency-ordered database setup

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use dbsetup::commands::{self, graph::ExportFormat, run::RunArgs, Global, SelectArgs};
use dbsetup::orchestrator::PlanOptions;
use dbsetup::types::EntryKind;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbsetup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Manifest path (dbsetup.toml or dbsetup.json)
    #[arg(short, long, env = "DBSETUP_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Select {
    /// Schema to include (repeatable)
    #[arg(short, long = "schema", value_name = "NAME")]
    schemas: Vec<String>,

    /// View to include (repeatable)
    #[arg(long = "view", value_name = "NAME")]
    views: Vec<String>,

    /// Select every entry of kinds without explicit names
    #[arg(short = 'y', long = "yes")]
    all: bool,
}

impl From<Select> for SelectArgs {
    fn from(s: Select) -> Self {
        Self {
            schemas: s.schemas,
            views: s.views,
            all: s.all,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List schemas and views with their dependencies
    List,

    /// Validate a selection (defaults to everything)
    Check {
        #[command(flatten)]
        select: Select,
    },

    /// Print the dependency-resolved order (defaults to everything)
    Order {
        #[command(flatten)]
        select: Select,
    },

    /// Export a dependency graph
    Graph {
        /// Collection to export (schema, view)
        #[arg(short, long, default_value = "schema")]
        kind: EntryKind,

        /// Output format (dot, json)
        #[arg(short, long, default_value = "dot")]
        format: ExportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Generate migrations, migrate, seed schemas and create views
    Run {
        #[command(flatten)]
        select: Select,

        /// Print the commands instead of executing them
        #[arg(long)]
        dry_run: bool,

        /// Environment name (selects .env.<name>)
        #[arg(short, long = "env", value_name = "NAME")]
        environment: Option<String>,

        /// Skip migration generation and execution
        #[arg(long)]
        skip_migrations: bool,

        /// Skip schema seeding
        #[arg(long)]
        skip_seed: bool,

        /// Skip view creation
        #[arg(long)]
        skip_views: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let global = Global {
        config: cli.config,
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    // Execute command
    match cli.command {
        Commands::List => commands::list::run(&global),
        Commands::Check { select } => commands::check::run(&global, select.into()),
        Commands::Order { select } => commands::order::run(&global, select.into()),
        Commands::Graph { kind, format, output } => {
            commands::graph::run(&global, kind, format, output)
        }
        Commands::Run {
            select,
            dry_run,
            environment,
            skip_migrations,
            skip_seed,
            skip_views,
        } => {
            let args = RunArgs {
                select: select.into(),
                dry_run,
                environment,
                options: PlanOptions {
                    migrations: !skip_migrations,
                    seed: !skip_seed,
                    views: !skip_views,
                },
            };
            commands::run::run(&global, args)
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
