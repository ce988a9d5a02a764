use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Zone translation engine CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "zonexlate", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a spatial (area-based) translation between two zoning layers
    Spatial(RunArgs),

    /// Run a weighted translation between two zoning layers via a lower zoning
    Weighted(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run configuration document (JSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Output directory for the factor table, its config, and the audit report
    #[arg(value_hint = ValueHint::DirPath)]
    pub out: PathBuf,
}
