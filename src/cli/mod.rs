//! Command-line parsing for the bike-sharing dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation/chart code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ViewId;

pub const DEFAULT_DATA_PATH: &str = "data/main_data.csv";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bike", version, about = "Bike-sharing analytics dashboard")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(DataArgs),
    /// Print every view's aggregated table.
    Summary(SummaryArgs),
    /// Write each view as SVG chart + CSV table, plus views.json.
    Export(ExportArgs),
}

/// Where the daily rentals file lives.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Daily bike-sharing CSV.
    #[arg(long, env = "BIKE_DATA", default_value = DEFAULT_DATA_PATH, value_name = "CSV")]
    pub data: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only print this view.
    #[arg(long, value_enum)]
    pub view: Option<ViewId>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory (created if missing).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// SVG width (pixels).
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// SVG height (pixels).
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_parses_size_and_view_ids() {
        let cli = Cli::parse_from(["bike", "export", "--out", "out", "--width", "800"]);
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.out, PathBuf::from("out"));
                assert_eq!((args.width, args.height), (800, 600));
            }
            other => panic!("unexpected {other:?}"),
        }

        let cli = Cli::parse_from(["bike", "summary", "--view", "workingday", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Summary(args) => assert_eq!(args.view, Some(ViewId::Workingday)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_view_is_rejected() {
        assert!(Cli::try_parse_from(["bike", "summary", "--view", "hourly"]).is_err());
    }
}
