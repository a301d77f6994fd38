//! Command-line arguments for the console harness

use std::path::PathBuf;

use clap::Parser;

/// Drive the restriction engine from stdin over an in-memory world
#[derive(Debug, Parser)]
#[command(name = "rlv-engine", version, about)]
pub struct Cli {
    /// JSON engine configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON description of the shared folder tree
    #[arg(short, long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Write JSON logs to a rolling file under `logs/` instead of stderr
    #[arg(long)]
    pub log_file: bool,
}
