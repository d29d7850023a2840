pub(crate) mod assets;
pub(crate) mod checkpoint;
pub(crate) mod config;
pub(crate) mod convert;
pub(crate) mod discover;
pub(crate) mod export_db;
pub(crate) mod harvest;
pub(crate) mod status;
pub(crate) mod update;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use reel_harvest_checkpoint::{Accumulator, CheckpointStore, GapConfig};
use reel_harvest_lib::Settings;
use reel_harvest_scraper::{FetcherConfig, Harvester, HttpFetcher, Site, SiteParser};

use crate::error::CliError;

/// Resolved settings plus the output mode, shared by every command.
pub(crate) struct Session {
    pub settings: Settings,
    pub quiet: bool,
}

impl Session {
    pub(crate) fn store(&self) -> CheckpointStore {
        CheckpointStore::new(&self.settings.paths.checkpoint)
    }

    /// Load the checkpoint (or start an empty one) into an accumulator.
    pub(crate) fn load_accumulator(&self) -> Result<(CheckpointStore, Accumulator), CliError> {
        let store = self.store();
        let checkpoint = store
            .load_or_new()
            .map_err(|e| CliError::checkpoint(format!("{}: {e}", store.path().display())))?;
        Ok((store, Accumulator::new(checkpoint)))
    }

    pub(crate) fn gap_config(&self) -> GapConfig {
        GapConfig {
            verify_threshold: self.settings.harvest.verify_threshold,
        }
    }

    pub(crate) fn harvester(&self) -> Result<Harvester<HttpFetcher, Site>, CliError> {
        let site = Site::by_name(&self.settings.harvest.site)
            .map_err(|e| CliError::config(e.to_string()))?;
        let config = FetcherConfig::from_settings(site.base_url(), &self.settings.harvest);
        let fetcher = HttpFetcher::new(config)
            .map_err(|e| CliError::harvest(format!("HTTP client setup failed: {e}")))?;
        Ok(Harvester::new(fetcher, site))
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {e}")))
}

/// Set `stop` on the first Ctrl-C. Must be called inside the runtime; abort
/// the handle when the run is over.
pub(crate) fn stop_on_ctrl_c(stop: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received; finishing in-flight work");
            stop.store(true, Ordering::Relaxed);
        }
    })
}

/// Save after discovery and keep a labelled backup of the result.
pub(crate) fn save_with_backup(
    accumulator: &mut Accumulator,
    store: &CheckpointStore,
    label: &str,
) -> Result<(), CliError> {
    if !accumulator.flush(store) {
        return Err(CliError::checkpoint(format!(
            "could not save {}",
            store.path().display()
        )));
    }
    match store.backup(label) {
        Ok(reel_harvest_checkpoint::BackupOutcome::Created { path, at }) => {
            log::debug!("backup written to {}", path.display());
            accumulator.set_last_backup_at(at);
        }
        Ok(reel_harvest_checkpoint::BackupOutcome::SourceMissing) => {}
        Err(e) => log::warn!("backup '{label}' failed: {e}"),
    }
    Ok(())
}
