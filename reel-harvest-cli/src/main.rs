//! reel-harvest CLI
//!
//! Command-line interface for harvesting streaming catalogs into a
//! checkpoint, exporting them to the Android app's database, and preparing
//! the app's image assets.

mod cli_types;
mod commands;
mod error;
mod logging;
mod progress;

use std::process::ExitCode;

use clap::Parser;

use reel_harvest_lib::Settings;

use cli_types::{AssetsAction, CheckpointAction, Cli, Commands, ConfigAction};
use commands::Session;
use error::CliError;
use logging::LogFile;

/// Log an empty line (keeps `--quiet` and the log file in step).
pub(crate) fn log_blank() {
    log::info!("");
}

/// Settings from file and environment, then the global flags on top.
fn resolve_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;
    if let Some(path) = &cli.checkpoint {
        settings.paths.checkpoint = path.clone();
    }
    if let Some(site) = &cli.site {
        settings.harvest.site = site.clone();
    }
    Ok(settings)
}

fn dispatch(command: Commands, session: &Session) -> Result<(), CliError> {
    match command {
        Commands::Discover { max_pages } => commands::discover::run_discover(session, max_pages),
        Commands::Status => commands::status::run_status(session),
        Commands::Gaps { threshold, limit } => {
            commands::status::run_gaps(session, threshold, limit)
        }
        Commands::Harvest {
            workers,
            verify,
            limit,
        } => commands::harvest::run_harvest_command(session, workers, verify, limit),
        Commands::Verify { workers } => commands::harvest::run_verify(session, workers),
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Backup { label } => commands::checkpoint::run_backup(session, &label),
            CheckpointAction::ResetPhase { phase } => {
                commands::checkpoint::run_reset_phase(session, &phase)
            }
            CheckpointAction::Dedupe => commands::checkpoint::run_dedupe(session),
            CheckpointAction::ExportJson { out } => {
                commands::checkpoint::run_export_json(session, &out)
            }
        },
        Commands::ExportDb { out, schema } => {
            commands::export_db::run_export_db(session, &out, schema.into())
        }
        Commands::Convert {
            source,
            out,
            stats,
            reverse,
        } => commands::convert::run_convert(&source, &out, stats, reverse),
        Commands::Update {
            once,
            interval,
            export,
        } => commands::update::run_update(session, once, interval, export.as_deref()),
        Commands::Assets { action } => match action {
            AssetsAction::Mipmaps { logo, name, out } => {
                commands::assets::run_mipmaps(&logo, &name, &out)
            }
            AssetsAction::Banner { image, name, out } => {
                commands::assets::run_banner(&image, &name, &out)
            }
        },
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => commands::config::run_config_show(session),
                ConfigAction::Path => commands::config::run_config_path(),
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli);

    let log_file = match (&cli.logfile, &cli.command, &settings) {
        (Some(path), _, _) => Some(LogFile::Fixed(path.clone())),
        (None, Commands::Update { .. }, Ok(settings)) => {
            Some(LogFile::Daily(settings.paths.log_dir.clone()))
        }
        _ => None,
    };
    if let Err(e) = logging::init(cli.quiet, cli.verbose, log_file.as_ref()) {
        eprintln!("Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let session = Session {
        settings,
        quiet: cli.quiet,
    };

    match dispatch(cli.command, &session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
