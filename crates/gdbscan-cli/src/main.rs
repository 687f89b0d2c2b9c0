//! Command-line interface for `gdbscan`, a read-only inspector for file geodatabases.
//!
//! This binary wraps the [`gdbscan_core`] library: it parses arguments, configures logging and
//! dispatches to command handlers.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! Diagnostics go to standard error through the tracing subscriber; report output (tables,
//! inventory lines) goes to standard output.
//!
//! # Available Commands
//!
//! - `check` - Report which expected feature classes exist at the workspace root
//! - `inventory` - Append feature counts and spatial references to a log file
//! - `scan` - Run `check` and `inventory` in one go
//! - `list` - List every feature class in the workspace

mod display;

use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use gdbscan_core::check::{CheckResult, check};
use gdbscan_core::error::{self as core_error, ConfigError, GdbScanError};
use gdbscan_core::inventory::{self, InventoryOptions};
use gdbscan_core::run_log::RunLog;
use gdbscan_core::store::{FileGdb, GeoStore};

#[derive(Parser)]
#[command(
    name = "gdbscan",
    version,
    about = "Read-only feature class checks and inventories for file geodatabases",
    long_about = "gdbscan inspects a geodatabase workspace without modifying it.\n\
                  It checks for expected feature classes and logs feature counts and\n\
                  spatial references to an append-only log file."
)]
/// Command-line arguments and options for the `gdbscan` CLI.
///
/// This struct defines the top-level CLI interface, including global flags for
/// logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Feature class names to look for.
#[derive(Args, Debug, Default)]
struct NameArgs {
    /// Feature class name to look for at the workspace root. Repeatable.
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    names: Vec<String>,

    /// File with one feature class name per line (`#` starts a comment).
    #[arg(long, value_name = "FILE")]
    names_file: Option<PathBuf>,
}

impl NameArgs {
    fn is_empty(&self) -> bool {
        self.names.is_empty() && self.names_file.is_none()
    }

    /// Names from `--name` followed by those from `--names-file`.
    fn resolve(&self) -> core_error::Result<Vec<String>> {
        let mut names = self.names.clone();
        if let Some(path) = &self.names_file {
            let text = std::fs::read_to_string(path).map_err(|e| ConfigError::NamesFile {
                path: path.clone(),
                source: e,
            })?;
            names.extend(parse_names(&text));
        }
        Ok(names)
    }
}

/// Available subcommands for the `gdbscan` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Checks a workspace for expected feature classes.
    ///
    /// Only names directly at the workspace root are resolved; feature classes inside
    /// feature datasets are not searched.
    Check {
        /// Path to the geodatabase workspace.
        #[arg(value_name = "WORKSPACE")]
        workspace: PathBuf,

        #[command(flatten)]
        names: NameArgs,

        /// Append a found/missing summary to this log file.
        #[arg(short, long, value_name = "FILE")]
        log_file: Option<PathBuf>,
    },

    /// Logs the feature count and spatial reference of every feature class.
    ///
    /// Each run appends a timestamped block to the log file; earlier runs are kept.
    Inventory {
        /// Path to the geodatabase workspace.
        #[arg(value_name = "WORKSPACE")]
        workspace: PathBuf,

        /// Log file to append to. Its folder must exist.
        #[arg(short, long, value_name = "FILE")]
        log_file: PathBuf,

        /// Sort feature classes by path instead of listing order.
        #[arg(long)]
        sort: bool,

        /// Do not mirror log lines to standard output.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Runs the existence check and the inventory against one workspace.
    ///
    /// The check runs when names are given, the inventory when a log file is given.
    Scan {
        /// Path to the geodatabase workspace.
        #[arg(value_name = "WORKSPACE")]
        workspace: PathBuf,

        #[command(flatten)]
        names: NameArgs,

        /// Log file for the inventory. Its folder must exist.
        #[arg(short, long, value_name = "FILE")]
        log_file: Option<PathBuf>,

        /// Sort feature classes by path instead of listing order.
        #[arg(long)]
        sort: bool,

        /// Do not mirror log lines to standard output.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Lists every feature class in the workspace, including those in feature datasets.
    List {
        /// Path to the geodatabase workspace.
        #[arg(value_name = "WORKSPACE")]
        workspace: PathBuf,

        /// Sort feature classes by path instead of listing order.
        #[arg(long)]
        sort: bool,
    },
}

/// Entry point for the `gdbscan` command-line interface.
///
/// Exits with status 0 when the command completes, even if individual feature classes
/// failed and were logged as errors. Fatal errors exit with status 1.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.debug) {
        eprintln!("error: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let log_level = if debug {
        Level::DEBUG
    } else if verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true) // Show module paths for better context
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Check {
            workspace,
            names,
            log_file,
        } => {
            info!("Checking {}", workspace.display());
            handle_check(&workspace, &names, log_file.as_deref())
        },
        Commands::Inventory {
            workspace,
            log_file,
            sort,
            quiet,
        } => {
            info!("Inventory of {}", workspace.display());
            handle_inventory(&workspace, &log_file, sort, quiet)
        },
        Commands::Scan {
            workspace,
            names,
            log_file,
            sort,
            quiet,
        } => {
            info!("Scanning {}", workspace.display());
            handle_scan(&workspace, &names, log_file.as_deref(), sort, quiet)
        },
        Commands::List { workspace, sort } => handle_list(&workspace, sort),
    }
}

fn report_error(err: &anyhow::Error) {
    debug!("{err:?}");
    match err.downcast_ref::<GdbScanError>() {
        Some(e) => {
            eprintln!("error: {}", e.user_message());
            if let Some(hint) = e.recovery_suggestion() {
                eprintln!("hint: {hint}");
            }
        },
        None => eprintln!("error: {err:#}"),
    }
}

fn open_workspace(workspace: &Path) -> core_error::Result<FileGdb> {
    Ok(FileGdb::open(workspace)?)
}

fn open_log(log_file: &Path) -> core_error::Result<RunLog<LineWriter<File>>> {
    Ok(RunLog::open_append(log_file)?)
}

fn handle_check(workspace: &Path, names: &NameArgs, log_file: Option<&Path>) -> Result<()> {
    let names = names.resolve()?;
    let gdb = open_workspace(workspace)?;
    let log = log_file.map(open_log).transpose()?;

    let result = run_check(&gdb, &names);
    if let Some(mut log) = log {
        log.write_check_summary(Local::now().naive_local(), &result)
            .map_err(GdbScanError::from)?;
        log.finish().map_err(GdbScanError::from)?;
    }

    println!("\nScript completed successfully!");
    Ok(())
}

fn handle_inventory(workspace: &Path, log_file: &Path, sort: bool, quiet: bool) -> Result<()> {
    let gdb = open_workspace(workspace)?;
    let log = open_log(log_file)?;
    run_inventory(&gdb, log, log_file, sort, quiet)
}

/// Runs the checker and then the inventory.
///
/// Everything that can fail fatally (names file, workspace, log destination) is set up before
/// either part produces output.
fn handle_scan(
    workspace: &Path,
    names: &NameArgs,
    log_file: Option<&Path>,
    sort: bool,
    quiet: bool,
) -> Result<()> {
    if names.is_empty() && log_file.is_none() {
        return Err(GdbScanError::from(ConfigError::MissingRequired {
            option: "--name, --names-file or --log-file".to_string(),
        })
        .into());
    }

    let names = if names.is_empty() {
        None
    } else {
        Some(names.resolve()?)
    };
    let gdb = open_workspace(workspace)?;
    let log = log_file.map(open_log).transpose()?;

    if let Some(names) = &names {
        run_check(&gdb, names);
    }
    if let (Some(log), Some(log_file)) = (log, log_file) {
        run_inventory(&gdb, log, log_file, sort, quiet)?;
    }

    println!("\nScript completed successfully!");
    Ok(())
}

fn handle_list(workspace: &Path, sort: bool) -> Result<()> {
    let gdb = open_workspace(workspace)?;
    let mut enumeration = inventory::enumerate(&gdb).map_err(GdbScanError::from)?;
    if sort {
        enumeration.sort_by_path();
    }

    info!("Listing {}", gdb.locator());
    display::display_enumeration(&enumeration);
    Ok(())
}

fn run_check(gdb: &FileGdb, names: &[String]) -> CheckResult {
    debug!("Names to check: {names:?}");
    let result = check(gdb, names);
    display::display_check_result(&result);
    result
}

fn run_inventory<W: Write>(
    gdb: &FileGdb,
    mut log: RunLog<W>,
    log_file: &Path,
    sort: bool,
    quiet: bool,
) -> Result<()> {
    let summary = inventory::run_inventory(
        gdb,
        &mut log,
        Local::now().naive_local(),
        InventoryOptions { sort_by_path: sort },
        |entry| {
            if !quiet {
                println!("{entry}");
            }
        },
    )?;
    log.finish().map_err(GdbScanError::from)?;

    info!(
        "Logged {} feature class(es), {} error(s)",
        summary.total(),
        summary.failed
    );
    println!("Logging complete. Results written to: {}", log_file.display());
    Ok(())
}

/// Parses a names file: one name per line, blank lines and `#` comments skipped.
fn parse_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
