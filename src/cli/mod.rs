use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::cli::args::Cli;
use crate::cli::commands::backup::{run_backup_command, BackupRequest};
use crate::cli::commands::exit_for_error;
use crate::config::load::load_settings;
use crate::logging;
use crate::types::RunMode;

pub mod args;
pub mod commands;

pub fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(2),
            });
        }
    };

    if !cli.has_jobs() {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    let settings = match load_settings(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("settings: {}", err);
            return Ok(ExitCode::from(2));
        }
    };
    // Dropped at the end of this function, after the last log line.
    let _log_guard = logging::init(cli.verbose, settings.log_file.as_deref())?;

    let run_mode = RunMode {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };
    let request = BackupRequest {
        device: cli.device.as_ref(),
        jobs_file: cli.config.as_deref(),
        unmount_after: cli.unmount_after,
    };
    let code = match run_backup_command(&request, &settings, run_mode) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => exit_for_error(&err),
    };
    Ok(code)
}
