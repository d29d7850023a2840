use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc;

use reel_harvest_checkpoint::Accumulator;
use reel_harvest_lib::async_util::run_with_events;
use reel_harvest_scraper::{
    DiscoverOptions, DiscoverySummary, HarvestContext, Harvester, HttpFetcher, Site,
    discover_catalog,
};

use super::{Session, runtime, save_with_backup, stop_on_ctrl_c};
use crate::error::CliError;
use crate::progress::HarvestProgress;

/// Walk every category once, rendering progress. Does not save.
pub(crate) async fn discover_pass(
    session: &Session,
    harvester: &Harvester<HttpFetcher, Site>,
    accumulator: &mut Accumulator,
    max_pages: u32,
    stop: Arc<AtomicBool>,
) -> Result<DiscoverySummary, CliError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = HarvestContext::with_stop_flag(tx, stop);
    let options = DiscoverOptions { max_pages };
    let mut progress = HarvestProgress::new(0, session.quiet);

    let task = async move {
        let result = discover_catalog(
            harvester.fetcher(),
            harvester.site(),
            accumulator,
            &options,
            &ctx,
        )
        .await;
        drop(ctx);
        result
    };
    let result = run_with_events(task, rx, |e| progress.handle(e)).await;
    progress.finish();
    result.map_err(|e| CliError::harvest(e.to_string()))
}

pub(crate) fn log_discovery(summary: &DiscoverySummary) {
    crate::log_blank();
    log::info!(
        "  Pages fetched:  {:>8}",
        summary.pages_fetched.if_supports_color(Stdout, |t| t.cyan())
    );
    log::info!(
        "  New items:      {:>8}",
        summary.new_items.if_supports_color(Stdout, |t| t.green())
    );
    if summary.interrupted {
        log::warn!("Discovery was interrupted; the phase was left unchanged");
    }
}

pub(crate) fn run_discover(session: &Session, max_pages: u32) -> Result<(), CliError> {
    let harvester = session.harvester()?;
    let (store, mut accumulator) = session.load_accumulator()?;

    log::info!(
        "{} {} ({} known items)",
        "Discovering".if_supports_color(Stdout, |t| t.bold()),
        session.settings.harvest.site,
        accumulator.show_count()
    );

    let rt = runtime()?;
    let summary = rt.block_on(async {
        let stop = Arc::new(AtomicBool::new(false));
        let ctrl_c = stop_on_ctrl_c(stop.clone());
        let summary = discover_pass(session, &harvester, &mut accumulator, max_pages, stop).await;
        ctrl_c.abort();
        summary
    })?;

    save_with_backup(&mut accumulator, &store, "after_discovery")?;
    log_discovery(&summary);
    log::info!(
        "{} Saved {} shows to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        accumulator.show_count(),
        store.path().display()
    );
    Ok(())
}
