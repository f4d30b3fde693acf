use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "compliance-checkr",
    about = "Resolve license compliance obligations across a build dependency graph",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory that metadata file paths are relative to
    #[arg(long, default_value = ".", global = true)]
    pub root_dir: PathBuf,

    /// Config file [default: ./.compliance-checkr/config.toml, fallback ~/.config/compliance-checkr/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT", global = true)]
    pub report: ReportFormat,

    /// Only print summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Every node reachable from the roots with its resolved conditions
    Resolve(Roots),
    /// Shipped nodes and where they are installed
    Shipped(Roots),
    /// Who must provide notices for what
    Notices(Roots),
    /// Who must share source for what
    Sharing(Roots),
    /// Policy-prohibited combinations; exits 1 when any are found
    Conflicts(Roots),
}

#[derive(clap::Args, Debug)]
pub struct Roots {
    /// Root license metadata files (the `.meta_lic` suffix may be omitted)
    #[arg(required = true, value_name = "ROOT")]
    pub roots: Vec<String>,
}

impl Command {
    pub fn roots(&self) -> &[String] {
        match self {
            Command::Resolve(r)
            | Command::Shipped(r)
            | Command::Notices(r)
            | Command::Sharing(r)
            | Command::Conflicts(r) => &r.roots,
        }
    }
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
