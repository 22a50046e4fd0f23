//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - reads `.env` and parses CLI arguments
//! - sets up logging
//! - loads the dataset
//! - hands off to the TUI or a batch command

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DataArgs, ExportArgs, SummaryArgs};
use crate::domain::{Dataset, ViewId};
use crate::error::AppError;

pub mod pipeline;

/// Log file used while the TUI owns the terminal.
pub const TUI_LOG_FILE: &str = "bike-dashboard.log";

/// Entry point for the `bike` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal.
    dotenvy::dotenv().ok();

    // We want `bike` and `bike --data x.csv` to behave like `bike tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let tui = matches!(cli.command, Command::Tui(_));
    init_logging(cli.verbose, tui);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, tui: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // Runs before the TUI enters raw mode, so stderr is still readable here.
    let result = if tui {
        match open_log_file(Path::new(TUI_LOG_FILE)) {
            Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
            Err(err) => {
                eprintln!("warning: {err}; dashboard logging disabled");
                return;
            }
        }
    } else {
        builder.with_writer(io::stderr).try_init()
    };

    if let Err(err) = result {
        eprintln!("warning: failed to install logger: {err}");
    }
}

fn open_log_file(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::terminal(format!("Failed to create log file '{}': {e}", path.display())))
}

fn load(args: &DataArgs) -> Result<Dataset, AppError> {
    crate::io::ingest::load(&args.data)
}

fn handle_tui(args: DataArgs) -> Result<(), AppError> {
    let dataset = load(&args)?;
    crate::tui::run(dataset)
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let dataset = load(&args.data)?;
    let ids: Vec<ViewId> = match args.view {
        Some(id) => vec![id],
        None => ViewId::ALL.to_vec(),
    };

    let outputs = pipeline::build_views(&dataset, &ids)?;

    print!("{}", crate::report::format_dataset_summary(&args.data.data, dataset.stats()));
    for out in &outputs {
        print!("{}", crate::report::format_view(out.id, &out.view));
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let dataset = load(&args.data)?;
    let written = export_all(&dataset, &args.out, (args.width, args.height))?;
    println!("Wrote {written} files to {}", args.out.display());
    Ok(())
}

/// Write every view's table and chart plus `views.json` into `dir`.
///
/// Returns the number of files written. Views with nothing to draw still get
/// their (empty) table; only the SVG is skipped.
pub fn export_all(dataset: &Dataset, dir: &Path, size: (u32, u32)) -> Result<usize, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::export(format!("Failed to create '{}': {e}", dir.display())))?;

    let outputs = pipeline::build_views(dataset, &ViewId::ALL)?;
    let mut written = 0usize;

    for out in &outputs {
        let name = out.id.as_str();
        crate::io::export::write_view_csv(&dir.join(format!("{name}.csv")), &out.view)?;
        written += 1;

        match &out.chart {
            Ok(chart) => {
                crate::io::export::write_chart_svg(&dir.join(format!("{name}.svg")), chart, size)?;
                written += 1;
            }
            Err(err) if err.is_recoverable() => warn!(view = name, "skipping chart: {err}"),
            Err(err) => return Err(err.clone()),
        }
    }

    let views: Vec<(ViewId, &crate::aggregate::AggregatedView)> = outputs.iter().map(|o| (o.id, &o.view)).collect();
    crate::io::export::write_views_json(&dir.join("views.json"), &views)?;
    written += 1;

    info!(dir = %dir.display(), files = written, "export complete");
    Ok(written)
}

/// Rewrite argv so `bike` defaults to `bike tui`.
///
/// Rules:
/// - `bike`                       -> `bike tui`
/// - `bike --data x.csv ...`      -> `bike tui --data x.csv ...`
/// - `bike --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_dashboard() {
        assert_eq!(rewrite_args(args(&["bike"])), args(&["bike", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_the_dashboard() {
        assert_eq!(
            rewrite_args(args(&["bike", "--data", "x.csv"])),
            args(&["bike", "tui", "--data", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for argv in [
            args(&["bike", "summary", "--view", "season"]),
            args(&["bike", "export", "--out", "o"]),
            args(&["bike", "--help"]),
            args(&["bike", "-V"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }

    #[test]
    fn unwritable_log_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("bike.log");

        let err = open_log_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Terminal(_)));
        assert!(err.to_string().contains("bike.log"), "{err}");

        assert!(open_log_file(&dir.path().join("bike.log")).is_ok());
    }
}
