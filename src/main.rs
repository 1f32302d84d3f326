//! Binary entry point for watchbot.
//!
//! This binary manages keyword watches and replays chat messages through the
//! notification router.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use watchbot::cli::{ScanOutputFormat, cmd_scan, cmd_watch, load_roster};
use watchbot::config::{CONFIG_PATH_ENV, WatchbotConfig};
use watchbot::services::{InMemoryRoster, WatchService};
use watchbot::{UserId, observability};

/// Watchbot - keyword-watch notifications for group chats.
#[derive(Parser)]
#[command(name = "watchbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a watch command for a user.
    ///
    /// With no arguments, shows the user's settings. Otherwise one of:
    /// `add <keyword> [match-case] [whole-word]`, `delete <n>|all`, `on`,
    /// `off`, `activityTimeout <seconds>`, `suppress <seconds>`.
    Watch {
        /// User ID to act for.
        #[arg(short, long)]
        user: UserId,

        /// Sub-command and its arguments.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Replay chat messages (JSON lines) and print notifications.
    Scan {
        /// Message file; reads stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Roster file seeding presence and chat membership.
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_config(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &WatchbotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = WatchService::open(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Watch { user, args } => cmd_watch(&service, user, &args, &mut out)?,

        Commands::Scan {
            input,
            roster,
            format,
        } => {
            let format: ScanOutputFormat = format.parse()?;
            let mut roster = match roster {
                Some(path) => load_roster(&path)?,
                None => InMemoryRoster::new(),
            };
            match input {
                Some(path) => {
                    let file = open_input(&path)?;
                    cmd_scan(&service, &mut roster, BufReader::new(file), format, &mut out)?;
                },
                None => {
                    cmd_scan(&service, &mut roster, io::stdin().lock(), format, &mut out)?;
                },
            }
        },
    }

    Ok(())
}

fn open_input(path: &Path) -> watchbot::Result<File> {
    File::open(path).map_err(|e| watchbot::Error::OperationFailed {
        operation: "open_input".to_string(),
        cause: format!("{}: {}", path.display(), e),
    })
}

/// Loads configuration from `--config`, `$WATCHBOT_CONFIG_PATH` or the
/// default location, then applies environment overrides.
fn load_config(path: Option<&str>) -> Result<WatchbotConfig, Box<dyn std::error::Error>> {
    if let Some(config_path) = path {
        return Ok(WatchbotConfig::load_from_file(Path::new(config_path))?.with_env_overrides());
    }

    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        if !config_path.trim().is_empty() {
            return Ok(
                WatchbotConfig::load_from_file(Path::new(&config_path))?.with_env_overrides()
            );
        }
    }

    Ok(WatchbotConfig::load_default().with_env_overrides())
}
