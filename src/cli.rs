//! Command-line interface: argument definitions, logging setup, and the
//! top-level run sequence.

use crate::config::SortConfig;
use crate::output::OutputFormatter;
use crate::sorter::{SortRequest, TreeSorter};
use clap::Parser;
use log::{LevelFilter, warn};
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Sort files by type and relocate project folders intact.
#[derive(Debug, Parser)]
#[command(
    name = "treesort",
    version,
    about = "Sort files by type and relocate project folders intact",
    after_help = "Examples:\n  \
        treesort /path/to/messy/folder\n  \
        treesort /path/to/source -o /path/to/destination --dry-run\n  \
        treesort /path/to/source --delete-empty-dirs --verbose"
)]
pub struct Args {
    /// Directory containing the files to be sorted.
    pub input_dir: PathBuf,

    /// Output directory for sorted files (default: <input>_Sorted beside the input).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Show what would be done without making changes.
    #[arg(long)]
    pub dry_run: bool,

    /// Remove directories left empty after sorting.
    #[arg(long)]
    pub delete_empty_dirs: bool,

    /// Path to a custom JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs (at debug level) to the given file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Draw a progress bar while sorting.
    #[arg(long)]
    pub progress: bool,
}

/// Runs the tool end to end and returns the process exit code: 0 when the
/// run completed with zero errors, 1 otherwise.
pub fn run(args: Args) -> i32 {
    if let Err(message) = init_logging(args.verbose, args.log_file.as_deref()) {
        OutputFormatter::error(&message);
        return 1;
    }

    let config = match SortConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Configuration loading failed ({}); continuing with defaults", e);
            SortConfig::default()
        }
    };

    if args.dry_run {
        OutputFormatter::dry_run_notice("No files will be moved");
    }

    let request = SortRequest {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        dry_run: args.dry_run,
        delete_empty_dirs: args.delete_empty_dirs,
        show_progress: args.progress,
    };

    let sorter = TreeSorter::new(&config);
    match sorter.sort(&request) {
        Ok(report) => {
            OutputFormatter::summary_table(&report);
            if report.success() {
                OutputFormatter::success("Sorting completed");
                0
            } else {
                OutputFormatter::warning(&format!(
                    "Sorting completed with {} error(s); affected items were left in place",
                    report.errors
                ));
                1
            }
        }
        Err(e) => {
            log::error!("Path validation failed: {}", e);
            OutputFormatter::error(&e.to_string());
            1
        }
    }
}

/// Console logging always; file logging (at debug level) when requested.
/// An unwritable log file is a hard error, reported before sorting starts.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<(), String> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("Cannot create log file '{}': {}", path.display(), e))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, LogConfig::default(), file));
    }

    CombinedLogger::init(loggers).map_err(|e| format!("Logger initialization failed: {}", e))
}
