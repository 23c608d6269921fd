//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{analyze, check, layout_cmd};

#[derive(Parser)]
#[command(name = "calgrid")]
#[command(author, version, about = "Calendar task layout with overlap and conflict analysis")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to calgrid.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the full calendar layout for a task file
    Layout {
        /// Task file (JSON or YAML)
        tasks: PathBuf,
    },

    /// Report overlaps between tasks
    Overlaps {
        /// Task file (JSON or YAML)
        tasks: PathBuf,
    },

    /// Rank tasks by computed priority
    Rank {
        /// Task file (JSON or YAML)
        tasks: PathBuf,

        /// Show only the top N tasks
        #[arg(long)]
        top: Option<usize>,
    },

    /// Validate a task file and report conflicts
    ///
    /// Exits non-zero when validation finds errors.
    Check {
        /// Task file (JSON or YAML)
        tasks: PathBuf,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("calgrid starting");

    match cli.command {
        Commands::Layout { tasks } => layout_cmd::run(&output, &tasks, cli.config.as_deref())?,
        Commands::Overlaps { tasks } => analyze::overlaps(&output, &tasks, cli.config.as_deref())?,
        Commands::Rank { tasks, top } => {
            analyze::rank(&output, &tasks, cli.config.as_deref(), top)?
        }
        Commands::Check { tasks } => check::run(&output, &tasks)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
