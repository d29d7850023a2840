//! Periodic discover + harvest + export loop.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_db::SchemaVariant;
use reel_harvest_scraper::{DEFAULT_MAX_PAGES, Harvester, HttpFetcher, PlanOptions, Site};

use super::discover::{discover_pass, log_discovery};
use super::export_db::{export_to, log_export};
use super::harvest::{harvest_pass, log_report};
use super::{Session, runtime, save_with_backup, stop_on_ctrl_c};
use crate::error::CliError;

/// Wait after a failed cycle before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

async fn run_cycle(
    session: &Session,
    harvester: &Harvester<HttpFetcher, Site>,
    export: Option<&Path>,
    stop: &Arc<AtomicBool>,
) -> Result<(), CliError> {
    let (store, mut accumulator) = session.load_accumulator()?;

    let summary = discover_pass(
        session,
        harvester,
        &mut accumulator,
        DEFAULT_MAX_PAGES,
        stop.clone(),
    )
    .await?;
    save_with_backup(&mut accumulator, &store, "after_discovery")?;
    log_discovery(&summary);

    if !stop.load(Ordering::Relaxed) {
        let report = harvest_pass(
            session,
            harvester,
            &mut accumulator,
            &store,
            &PlanOptions::default(),
            session.settings.harvest.workers,
            stop.clone(),
        )
        .await;
        if let Some(report) = report {
            log_report(session, &report);
        }
    }

    if !accumulator.flush(&store) {
        return Err(CliError::checkpoint(format!(
            "could not save {}",
            store.path().display()
        )));
    }

    if let Some(out) = export {
        let stats = export_to(accumulator.checkpoint(), out, SchemaVariant::Room)?;
        log_export(&stats, out);
    }
    Ok(())
}

/// Sleep for `total`, waking early once `stop` is set. Returns `false` when
/// interrupted.
async fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) -> bool {
    let step = Duration::from_secs(1);
    let mut slept = Duration::ZERO;
    while slept < total {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let nap = step.min(total - slept);
        tokio::time::sleep(nap).await;
        slept += nap;
    }
    !stop.load(Ordering::Relaxed)
}

pub(crate) fn run_update(
    session: &Session,
    once: bool,
    interval_minutes: u64,
    export: Option<&Path>,
) -> Result<(), CliError> {
    let harvester = session.harvester()?;
    let interval = Duration::from_secs(interval_minutes.max(1) * 60);

    log::info!(
        "{} {} every {} min{}",
        "Auto-update".if_supports_color(Stdout, |t| t.bold()),
        session.settings.harvest.site,
        interval_minutes.max(1),
        if once { " (single cycle)" } else { "" }
    );

    let rt = runtime()?;
    rt.block_on(async {
        let stop = Arc::new(AtomicBool::new(false));
        let ctrl_c = stop_on_ctrl_c(stop.clone());
        let mut cycle = 0u64;

        let outcome = loop {
            cycle += 1;
            crate::log_blank();
            log::info!(
                "{} {} at {}",
                "Cycle".if_supports_color(Stdout, |t| t.bold()),
                cycle,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );

            let result = run_cycle(session, &harvester, export, &stop).await;
            let wait = match &result {
                Ok(()) => {
                    log::info!(
                        "{} Cycle {cycle} complete",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green())
                    );
                    interval
                }
                Err(e) => {
                    log::error!("Cycle {cycle} failed: {e}");
                    RETRY_DELAY
                }
            };

            if once {
                break result;
            }
            if stop.load(Ordering::Relaxed) {
                break Ok(());
            }

            let next = chrono::Local::now()
                + chrono::Duration::from_std(wait).unwrap_or_else(|_| chrono::Duration::zero());
            log::info!("  Next cycle at {}", next.format("%H:%M:%S"));
            if !sleep_unless_stopped(wait, &stop).await {
                break Ok(());
            }
        };

        ctrl_c.abort();
        if stop.load(Ordering::Relaxed) {
            log::info!("Stopped after {cycle} cycle(s)");
        }
        outcome
    })
}
