//! `compliance-checkr` — read license metadata, resolve conditions, and report
//! who must act on what.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`compliance_checkr::config::load_config`]).
//! 3. Read the license graph from the root files.
//! 4. Resolve conditions and run the requested query.
//! 5. Render the requested report ([`report`]).
//! 6. Exit `0`, or `1` when `conflicts` finds any.

mod cli;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ReportFormat};
use compliance_checkr::config::load_config;
use compliance_checkr::{
    conflicting_conditions, read_license_graph, resolve_notices, resolve_source_sharing,
    FsSource, Resolver,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Directory searched for `.compliance-checkr/config.toml`.
fn project_dir() -> Result<PathBuf> {
    std::env::current_dir().context("resolving the working directory")
}

fn print_json<T: serde::Serialize>(rows: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let root_dir = cli
        .root_dir
        .canonicalize()
        .unwrap_or_else(|_| cli.root_dir.clone());

    let config = load_config(&project_dir()?, cli.config.as_deref())?;
    let options = config.reader_options()?;

    let source = Arc::new(FsSource::new(&root_dir));
    let graph = read_license_graph(source, cli.command.roots(), &options)
        .await
        .with_context(|| format!("reading license graph under {}", root_dir.display()))?;
    let mut resolver = Resolver::new(&graph);
    let json = matches!(cli.report, ReportFormat::Json);

    match &cli.command {
        Command::Resolve(_) => {
            let rows = report::node_rows(&mut resolver);
            if json {
                print_json(&rows)?;
            } else {
                report::terminal::render_nodes(&rows, cli.quiet);
            }
        }
        Command::Shipped(_) => {
            let rows = report::shipped_rows(&graph);
            if json {
                print_json(&rows)?;
            } else {
                report::terminal::render_shipped(&rows, cli.quiet);
            }
        }
        Command::Notices(_) => {
            let rows = report::action_rows(&graph, &resolve_notices(&mut resolver));
            if json {
                print_json(&rows)?;
            } else {
                report::terminal::render_actions("Notices to provide", &rows, cli.quiet);
            }
        }
        Command::Sharing(_) => {
            let rows = report::action_rows(&graph, &resolve_source_sharing(&mut resolver));
            if json {
                print_json(&rows)?;
            } else {
                report::terminal::render_actions("Source to share", &rows, cli.quiet);
            }
        }
        Command::Conflicts(_) => {
            let rows = report::conflict_rows(&graph, conflicting_conditions(&mut resolver));
            if json {
                print_json(&rows)?;
            } else {
                report::terminal::render_conflicts(&rows, cli.quiet);
            }
            if !rows.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
