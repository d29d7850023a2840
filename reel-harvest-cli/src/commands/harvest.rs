use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc;

use reel_harvest_checkpoint::{Accumulator, CheckpointStore, analyze};
use reel_harvest_lib::async_util::run_with_events;
use reel_harvest_scraper::{
    HarvestContext, HarvestOptions, HarvestReport, Harvester, HttpFetcher, PlanOptions, Site,
    plan_tasks, run_harvest,
};

use super::{Session, runtime, stop_on_ctrl_c};
use crate::error::CliError;
use crate::progress::HarvestProgress;

/// Analyze the accumulator, plan tasks and run them. `None` when there was
/// nothing to do.
pub(crate) async fn harvest_pass(
    session: &Session,
    harvester: &Harvester<HttpFetcher, Site>,
    accumulator: &mut Accumulator,
    store: &CheckpointStore,
    plan: &PlanOptions,
    workers: usize,
    stop: Arc<AtomicBool>,
) -> Option<HarvestReport> {
    let gaps = analyze(accumulator.checkpoint(), &session.gap_config());
    let tasks = plan_tasks(&gaps, plan);
    if tasks.is_empty() {
        log::info!(
            "{} Nothing to harvest",
            "\u{2714}".if_supports_color(Stdout, |t| t.green())
        );
        return None;
    }

    let options = HarvestOptions {
        workers,
        flush_every: session.settings.harvest.flush_every,
        task_timeout: Duration::from_secs(session.settings.harvest.task_timeout_secs),
    };
    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = HarvestContext::with_stop_flag(tx, stop);
    let mut progress = HarvestProgress::new(options.worker_count(), session.quiet);

    let task = async move {
        let report = run_harvest(harvester, tasks, accumulator, store, &options, &ctx).await;
        drop(ctx);
        report
    };
    let report = run_with_events(task, rx, |e| progress.handle(e)).await;
    progress.finish();
    Some(report)
}

fn report_path(session: &Session) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    session
        .settings
        .paths
        .log_dir
        .join(format!("harvest_{stamp}.log"))
}

/// Print the outcome and keep a copy of the report when tasks failed.
pub(crate) fn log_report(session: &Session, report: &HarvestReport) {
    let summary = report.summary();

    crate::log_blank();
    log::info!("{}", "Harvest Summary".if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  Succeeded:        {:>8}",
        summary.succeeded.if_supports_color(Stdout, |t| t.green())
    );
    log::info!(
        "  Failed:           {:>8}",
        summary.failed.if_supports_color(Stdout, |t| t.red())
    );
    log::info!("  Not started:      {:>8}", summary.pending);
    log::info!("  Items updated:    {:>8}", report.items_updated);
    log::info!("  Episodes added:   {:>8}", report.episodes_inserted);
    log::info!("  Episodes updated: {:>8}", report.episodes_updated);
    log::info!("  Videos resolved:  {:>8}", report.videos_resolved);

    if report.failed_flushes > 0 {
        log::warn!(
            "{} of {} checkpoint saves failed",
            report.failed_flushes,
            report.flushes
        );
    }
    if report.interrupted {
        log::warn!("Harvest was interrupted; rerun to pick up the remaining tasks");
    }

    if summary.failed > 0 {
        let path = report_path(session);
        let written = std::fs::create_dir_all(&session.settings.paths.log_dir)
            .and_then(|()| report.write_to_file(&path));
        match written {
            Ok(()) => log::info!(
                "  Failure details: {}",
                path.display().if_supports_color(Stdout, |t| t.cyan())
            ),
            Err(e) => log::warn!("could not write {}: {e}", path.display()),
        }
    }
}

fn run_plan(session: &Session, plan: PlanOptions, workers: Option<usize>) -> Result<(), CliError> {
    let harvester = session.harvester()?;
    let (store, mut accumulator) = session.load_accumulator()?;
    let workers = workers.unwrap_or(session.settings.harvest.workers);

    let rt = runtime()?;
    let report = rt.block_on(async {
        let stop = Arc::new(AtomicBool::new(false));
        let ctrl_c = stop_on_ctrl_c(stop.clone());
        let report =
            harvest_pass(session, &harvester, &mut accumulator, &store, &plan, workers, stop).await;
        ctrl_c.abort();
        report
    });

    if let Some(report) = report {
        log_report(session, &report);
    }
    Ok(())
}

pub(crate) fn run_harvest_command(
    session: &Session,
    workers: Option<usize>,
    verify: bool,
    limit: Option<usize>,
) -> Result<(), CliError> {
    let plan = PlanOptions {
        verify,
        limit,
        ..PlanOptions::default()
    };
    run_plan(session, plan, workers)
}

pub(crate) fn run_verify(session: &Session, workers: Option<usize>) -> Result<(), CliError> {
    run_plan(session, PlanOptions::verify_only(), workers)
}
