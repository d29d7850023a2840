use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_checkpoint::Checkpoint;
use reel_harvest_db::{ExportOptions, ExportStats, SchemaVariant, export_checkpoint, open_database};

use super::Session;
use crate::error::CliError;

/// Upsert `checkpoint` into the database at `out`, creating the schema if
/// the file is new.
pub(crate) fn export_to(
    checkpoint: &Checkpoint,
    out: &Path,
    variant: SchemaVariant,
) -> Result<ExportStats, CliError> {
    let conn = open_database(out, variant)
        .map_err(|e| CliError::database(format!("{}: {e}", out.display())))?;
    export_checkpoint(&conn, checkpoint, &ExportOptions::default())
        .map_err(|e| CliError::database(e.to_string()))
}

pub(crate) fn log_export(stats: &ExportStats, out: &Path) {
    log::info!(
        "{} Exported to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        out.display().if_supports_color(Stdout, |t| t.cyan())
    );
    log::info!("  Movies:         {:>8}", stats.movies);
    log::info!("  Series:         {:>8}", stats.series);
    log::info!("  Episodes:       {:>8}", stats.episodes);
    log::info!("  Video URLs:     {:>8}", stats.video_urls);
    log::info!("  Genres:         {:>8}", stats.genres);
    if stats.skipped_episodes > 0 {
        log::warn!(
            "{} episodes without a number or known show were skipped",
            stats.skipped_episodes
        );
    }
}

pub(crate) fn run_export_db(
    session: &Session,
    out: &Path,
    variant: SchemaVariant,
) -> Result<(), CliError> {
    let store = session.store();
    let checkpoint = store
        .load()
        .map_err(|e| CliError::checkpoint(format!("{}: {e}", store.path().display())))?
        .ok_or_else(|| {
            CliError::checkpoint(format!("{} does not exist", store.path().display()))
        })?;

    log::info!(
        "{} {} shows, {} episodes ({} schema)",
        "Exporting".if_supports_color(Stdout, |t| t.bold()),
        checkpoint.shows.len(),
        checkpoint.episodes.len(),
        variant.as_str()
    );
    let stats = export_to(&checkpoint, out, variant)?;
    log_export(&stats, out);
    Ok(())
}
