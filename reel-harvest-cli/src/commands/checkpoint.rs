use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_checkpoint::{
    BackupOutcome, Checkpoint, CheckpointStore, Phase, dedupe_episodes, dedupe_shows,
    write_catalog_json,
};

use super::Session;
use crate::error::CliError;

/// Back up the file on disk. Returns the recorded backup time.
fn backup(store: &CheckpointStore, label: &str) -> Result<String, CliError> {
    match store.backup(label) {
        Ok(BackupOutcome::Created { path, at }) => {
            log::info!(
                "{} Backup written to {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                path.display().if_supports_color(Stdout, |t| t.cyan())
            );
            Ok(at)
        }
        Ok(BackupOutcome::SourceMissing) => Err(CliError::checkpoint(format!(
            "nothing to back up: {} does not exist",
            store.path().display()
        ))),
        Err(e) => Err(CliError::checkpoint(format!("backup failed: {e}"))),
    }
}

fn load_existing(store: &CheckpointStore) -> Result<Checkpoint, CliError> {
    store
        .load()
        .map_err(|e| CliError::checkpoint(format!("{}: {e}", store.path().display())))?
        .ok_or_else(|| {
            CliError::checkpoint(format!("{} does not exist", store.path().display()))
        })
}

fn save(store: &CheckpointStore, checkpoint: &Checkpoint) -> Result<(), CliError> {
    store
        .try_save(checkpoint)
        .map_err(|e| CliError::checkpoint(format!("could not save: {e}")))
}

pub(crate) fn run_backup(session: &Session, label: &str) -> Result<(), CliError> {
    backup(&session.store(), label)?;
    Ok(())
}

pub(crate) fn run_reset_phase(session: &Session, phase: &str) -> Result<(), CliError> {
    let phase = Phase::parse(phase).ok_or_else(|| {
        CliError::other(format!(
            "unknown phase '{phase}' (expected catalog_discovery, detail_scraping or complete)"
        ))
    })?;
    let store = session.store();
    let mut checkpoint = load_existing(&store)?;
    checkpoint.last_backup_at = Some(backup(&store, "before_reset")?);

    let previous = checkpoint.phase;
    checkpoint.phase = phase;
    checkpoint.last_detail_index = None;
    save(&store, &checkpoint)?;
    log::info!(
        "{} Phase {} -> {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        previous,
        phase.if_supports_color(Stdout, |t| t.bold())
    );
    Ok(())
}

pub(crate) fn run_dedupe(session: &Session) -> Result<(), CliError> {
    let store = session.store();
    let mut checkpoint = load_existing(&store)?;

    let shows = dedupe_shows(&mut checkpoint);
    let episodes = dedupe_episodes(&mut checkpoint);
    if shows == 0 && episodes == 0 {
        log::info!(
            "{} No duplicates found",
            "\u{2714}".if_supports_color(Stdout, |t| t.green())
        );
        return Ok(());
    }

    checkpoint.last_backup_at = Some(backup(&store, "before_cleanup")?);
    save(&store, &checkpoint)?;
    log::info!(
        "{} Removed {} duplicate shows and {} duplicate episodes",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        shows,
        episodes
    );
    log::info!(
        "  Now {} shows, {} episodes",
        checkpoint.shows.len(),
        checkpoint.episodes.len()
    );
    Ok(())
}

pub(crate) fn run_export_json(session: &Session, out: &Path) -> Result<(), CliError> {
    let checkpoint = load_existing(&session.store())?;
    write_catalog_json(&checkpoint, out)
        .map_err(|e| CliError::checkpoint(format!("{}: {e}", out.display())))?;
    log::info!(
        "{} Wrote {} shows and {} episodes to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        checkpoint.shows.len(),
        checkpoint.episodes.len(),
        out.display().if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}
