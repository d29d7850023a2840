//! The parallel harvest executor.
//!
//! Tasks come from a gap report. Workers fetch and parse; the single result
//! loop in [`run_harvest`] owns the accumulator, so merging and flushing
//! never race. Nothing is retried: a failed task stays a gap and the next
//! run's analysis picks it up again.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::{Duration, Instant};

use reel_harvest_checkpoint::{Accumulator, CheckpointStore, GapReport, Phase, Upsert};
use reel_harvest_core::{CatalogItem, Episode, ItemKind};
use reel_harvest_lib::WorkerPool;
use reel_harvest_lib::worker_pool::SAFETY_TIMEOUT;

use crate::context::HarvestContext;
use crate::events::HarvestEvent;
use crate::fetcher::Fetcher;
use crate::report::{HarvestReport, TaskOutcome, TaskState};
use crate::site::{EpisodeLink, SiteParser};

pub const MAX_WORKERS: usize = 10;
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_FLUSH_EVERY: usize = 10;
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(600);

/// One unit of work for a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestTask {
    /// Detail page, then the movie video or every episode and its video.
    ScrapeItem(CatalogItem),
    /// Fetch the video page of each listed episode.
    ResolveVideos {
        show_id: String,
        episodes: Vec<Episode>,
    },
    /// Re-read a series page and fetch only episodes whose URL is new.
    VerifySeries {
        show: CatalogItem,
        existing: Vec<Episode>,
    },
}

impl HarvestTask {
    pub fn label(&self) -> String {
        match self {
            HarvestTask::ScrapeItem(item) => format!("scrape {} {}", item.kind, item.slug),
            HarvestTask::ResolveVideos { show_id, episodes } => {
                format!("videos for {show_id} ({} episodes)", episodes.len())
            }
            HarvestTask::VerifySeries { show, .. } => format!("verify {}", show.slug),
        }
    }
}

/// Which gap classes become tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    pub new_items: bool,
    pub resolve_videos: bool,
    pub verify: bool,
    pub limit: Option<usize>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            new_items: true,
            resolve_videos: true,
            verify: false,
            limit: None,
        }
    }
}

impl PlanOptions {
    pub fn verify_only() -> Self {
        Self {
            new_items: false,
            resolve_videos: false,
            verify: true,
            limit: None,
        }
    }
}

/// Turn a gap report into tasks: new items first (series before movies),
/// then missing videos, then verification. `manual_review` is never planned.
pub fn plan_tasks(report: &GapReport, options: &PlanOptions) -> Vec<HarvestTask> {
    let mut tasks = Vec::new();
    if options.new_items {
        tasks.extend(
            report
                .new_items()
                .map(|gap| HarvestTask::ScrapeItem(gap.item.clone())),
        );
    }
    if options.resolve_videos {
        tasks.extend(
            report
                .series_missing_video
                .iter()
                .map(|gap| HarvestTask::ResolveVideos {
                    show_id: gap.show_id.clone(),
                    episodes: gap.episodes.clone(),
                }),
        );
    }
    if options.verify {
        tasks.extend(
            report
                .verification_candidates
                .iter()
                .map(|gap| HarvestTask::VerifySeries {
                    show: gap.show.clone(),
                    existing: gap.existing.clone(),
                }),
        );
    }
    if let Some(limit) = options.limit {
        tasks.truncate(limit);
    }
    tasks
}

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub workers: usize,
    /// Save the checkpoint after this many completed tasks.
    pub flush_every: usize,
    pub task_timeout: Duration,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            flush_every: DEFAULT_FLUSH_EVERY,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}

impl HarvestOptions {
    pub fn worker_count(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }

    /// The per-task time budget, kept under the pool's safety net so a slow
    /// task always returns before the pool drops it.
    fn effective_task_timeout(&self) -> Duration {
        self.task_timeout
            .min(SAFETY_TIMEOUT.saturating_sub(Duration::from_secs(1)))
            .max(Duration::from_secs(1))
    }
}

/// Records a task produced for the accumulator.
#[derive(Debug, Default)]
pub struct TaskYield {
    pub items: Vec<CatalogItem>,
    pub episodes: Vec<Episode>,
    pub videos: usize,
}

/// Which tasks a worker picked up. Outcomes live in the result loop; a task
/// that was started but never reported was dropped by the pool.
struct DispatchLedger {
    started: Vec<AtomicBool>,
}

impl DispatchLedger {
    fn new(len: usize) -> Self {
        Self {
            started: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    fn mark_started(&self, index: usize) {
        if let Some(slot) = self.started.get(index) {
            slot.store(true, Ordering::Relaxed);
        }
    }

    fn unreported_state(&self, index: usize) -> TaskState {
        match self.started.get(index) {
            Some(slot) if slot.load(Ordering::Relaxed) => {
                TaskState::Failed("worker dropped the task".to_string())
            }
            _ => TaskState::Pending,
        }
    }
}

/// A fetcher paired with the site strategy that parses its pages.
pub struct Harvester<F, P> {
    fetcher: Arc<F>,
    site: Arc<P>,
}

impl<F, P> Clone for Harvester<F, P> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            site: self.site.clone(),
        }
    }
}

impl<F: Fetcher, P: SiteParser> Harvester<F, P> {
    pub fn new(fetcher: F, site: P) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            site: Arc::new(site),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn site(&self) -> &P {
        &self.site
    }

    async fn fetch_page(&self, url: &str) -> Result<String, String> {
        match self.fetcher.fetch(url).await {
            Ok(Some(body)) => Ok(body),
            Ok(None) => Err(format!("page unavailable: {url}")),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Run one task. `Err` carries the failure reason.
    ///
    /// Once the stop flag is set or `deadline` passes, nested episode fetches
    /// end early and the task returns what it already has. Episodes left
    /// without a video stay gaps for the next run.
    pub async fn run_task(
        &self,
        index: usize,
        label: &str,
        task: HarvestTask,
        ctx: &HarvestContext,
        deadline: Instant,
    ) -> Result<TaskYield, String> {
        match task {
            HarvestTask::ScrapeItem(mut item) => {
                let html = self.fetch_page(&item.url).await?;
                let detail = self.site.parse_detail(&html, &item);
                detail.fields.apply_to(&mut item);

                match item.kind {
                    ItemKind::Movie => {
                        let videos = usize::from(detail.video_url.is_some());
                        if detail.video_url.is_some() {
                            item.video_url = detail.video_url;
                        }
                        Ok(TaskYield {
                            items: vec![item],
                            episodes: Vec::new(),
                            videos,
                        })
                    }
                    ItemKind::Series => {
                        let episodes = episodes_from_links(&item.slug, detail.episodes);
                        if episodes.is_empty() {
                            log::warn!("{}: no episode links on {}", item.slug, item.url);
                        }
                        let (episodes, videos) = self
                            .resolve_videos(index, label, episodes, ctx, deadline)
                            .await;
                        Ok(TaskYield {
                            items: vec![item],
                            episodes,
                            videos,
                        })
                    }
                }
            }
            HarvestTask::ResolveVideos { episodes, .. } => {
                let (episodes, videos) = self
                    .resolve_videos(index, label, episodes, ctx, deadline)
                    .await;
                Ok(TaskYield {
                    items: Vec::new(),
                    episodes: episodes.into_iter().filter(Episode::has_video).collect(),
                    videos,
                })
            }
            HarvestTask::VerifySeries { mut show, existing } => {
                let html = self.fetch_page(&show.url).await?;
                let detail = self.site.parse_detail(&html, &show);
                detail.fields.apply_to(&mut show);

                let known: HashSet<&str> = existing.iter().map(|e| e.url.as_str()).collect();
                let fresh: Vec<EpisodeLink> = detail
                    .episodes
                    .into_iter()
                    .filter(|link| !known.contains(link.url.as_str()))
                    .collect();
                log::debug!("{}: {} episode links not yet recorded", show.slug, fresh.len());

                let episodes = episodes_from_links(&show.slug, fresh);
                let (episodes, videos) = self
                    .resolve_videos(index, label, episodes, ctx, deadline)
                    .await;
                Ok(TaskYield {
                    items: vec![show],
                    episodes,
                    videos,
                })
            }
        }
    }

    /// Fetch each episode's page and fill in its video URL where one is found.
    async fn resolve_videos(
        &self,
        index: usize,
        label: &str,
        mut episodes: Vec<Episode>,
        ctx: &HarvestContext,
        deadline: Instant,
    ) -> (Vec<Episode>, usize) {
        let total = episodes.len();
        let mut resolved = 0;
        for (done, ep) in episodes.iter_mut().enumerate() {
            if ctx.is_stopped() {
                log::debug!("{label}: stopping after {done} of {total} episodes");
                break;
            }
            if Instant::now() >= deadline {
                log::warn!("{label}: out of time after {done} of {total} episodes");
                break;
            }
            match self.fetcher.fetch(&ep.url).await {
                Ok(Some(html)) => {
                    if let Some(url) = self.site.parse_video(&html, ItemKind::Series) {
                        ep.video_url = Some(url);
                        resolved += 1;
                    }
                }
                Ok(None) => log::debug!("{}: episode page unavailable", ep.id),
                Err(e) => log::warn!("{}: {e}", ep.id),
            }
            ctx.emit(HarvestEvent::TaskProgress {
                index,
                label: label.to_string(),
                done: done + 1,
                total,
            });
        }
        (episodes, resolved)
    }
}

/// Episode records for the links of one series page. Links without a
/// number are keyed by their slug and dropped if they have none.
fn episodes_from_links(show_id: &str, links: Vec<EpisodeLink>) -> Vec<Episode> {
    links
        .into_iter()
        .filter_map(|link| {
            let mut ep = match link.number {
                Some(n) => Episode::numbered(show_id, link.season, n, link.url),
                None => {
                    let slug = link.slug.as_deref()?;
                    Episode {
                        id: format!("{show_id}_{slug}"),
                        show_id: show_id.to_string(),
                        season: link.season,
                        episode_number: None,
                        title: None,
                        slug: None,
                        url: link.url,
                        thumbnail: None,
                        video_url: None,
                    }
                }
            };
            ep.title = link.title;
            ep.slug = link.slug;
            ep.thumbnail = link.thumbnail;
            Some(ep)
        })
        .collect()
}

fn merge(accumulator: &mut Accumulator, output: TaskYield, report: &mut HarvestReport) {
    for item in output.items {
        if accumulator.upsert_item(item) != Upsert::Unchanged {
            report.items_updated += 1;
        }
    }
    for episode in output.episodes {
        match accumulator.upsert_episode(episode) {
            Upsert::Inserted => report.episodes_inserted += 1,
            Upsert::Updated => report.episodes_updated += 1,
            Upsert::Unchanged => {}
        }
    }
    report.videos_resolved += output.videos;
}

fn flush(
    accumulator: &mut Accumulator,
    store: &CheckpointStore,
    ctx: &HarvestContext,
    report: &mut HarvestReport,
) {
    let saved = accumulator.flush(store);
    report.flushes += 1;
    if !saved {
        report.failed_flushes += 1;
    }
    ctx.emit(HarvestEvent::Flushed {
        saved,
        shows: accumulator.show_count(),
        episodes: accumulator.episode_count(),
    });
}

/// Run `tasks` on a bounded worker pool, merging every result into
/// `accumulator` and saving it to `store` periodically and once at the end.
///
/// Setting the context's stop flag stops dispatch; tasks already running
/// finish and are merged, the rest stay [`TaskState::Pending`]. The phase is
/// set to complete only when the run was not interrupted.
pub async fn run_harvest<F: Fetcher, P: SiteParser>(
    harvester: &Harvester<F, P>,
    tasks: Vec<HarvestTask>,
    accumulator: &mut Accumulator,
    store: &CheckpointStore,
    options: &HarvestOptions,
    ctx: &HarvestContext,
) -> HarvestReport {
    let labels: Vec<String> = tasks.iter().map(HarvestTask::label).collect();
    let total = tasks.len();
    ctx.emit(HarvestEvent::Planned { total });
    log::info!(
        "Harvesting {total} tasks with {} workers",
        options.worker_count()
    );

    let ledger = Arc::new(DispatchLedger::new(total));
    let task_timeout = options.effective_task_timeout();
    let work: Vec<(usize, HarvestTask)> = tasks.into_iter().enumerate().collect();

    let mut pool = {
        let harvester = harvester.clone();
        let ctx = ctx.clone();
        let ledger = ledger.clone();
        WorkerPool::start_until(
            options.worker_count(),
            work,
            ctx.stop_flag(),
            move |(index, task): (usize, HarvestTask)| {
                let harvester = harvester.clone();
                let ctx = ctx.clone();
                let ledger = ledger.clone();
                async move {
                    ledger.mark_started(index);
                    let label = task.label();
                    ctx.emit(HarvestEvent::TaskStarted {
                        index,
                        label: label.clone(),
                    });
                    let deadline = Instant::now() + task_timeout;
                    let outcome = harvester.run_task(index, &label, task, &ctx, deadline).await;
                    (index, outcome)
                }
            },
        )
    };

    let mut report = HarvestReport::default();
    let mut states: Vec<Option<TaskState>> = vec![None; total];
    let flush_every = options.flush_every.max(1);
    let mut since_flush = 0;
    let mut completed = 0;
    let mut announced_stop = false;

    while let Some((index, outcome)) = pool.recv().await {
        let label = labels.get(index).map_or("", String::as_str);
        match outcome {
            Ok(output) => {
                let episodes = output.episodes.len();
                let videos = output.videos;
                merge(accumulator, output, &mut report);
                log::debug!("{label}: {episodes} episodes, {videos} videos");
                ctx.emit(HarvestEvent::TaskSucceeded {
                    index,
                    label: label.to_string(),
                    episodes,
                    videos,
                });
                states[index] = Some(TaskState::Succeeded);
            }
            Err(reason) => {
                log::warn!("{label}: {reason}");
                ctx.emit(HarvestEvent::TaskFailed {
                    index,
                    label: label.to_string(),
                    reason: reason.clone(),
                });
                states[index] = Some(TaskState::Failed(reason));
            }
        }

        completed += 1;
        accumulator.set_last_detail_index(Some(completed));

        if ctx.is_stopped() && !announced_stop {
            announced_stop = true;
            log::info!("Stop requested; letting in-flight tasks finish");
            ctx.emit(HarvestEvent::Stopping);
        }

        since_flush += 1;
        if since_flush >= flush_every {
            flush(accumulator, store, ctx, &mut report);
            since_flush = 0;
        }
    }

    report.interrupted = ctx.is_stopped();
    report.outcomes = states
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (state, label))| {
            let state = state.unwrap_or_else(|| ledger.unreported_state(index));
            TaskOutcome { label, state }
        })
        .collect();

    if !report.interrupted {
        accumulator.set_phase(Phase::Complete);
        accumulator.set_last_detail_index(None);
    }
    flush(accumulator, store, ctx, &mut report);

    let summary = report.summary();
    ctx.emit(HarvestEvent::Done {
        succeeded: summary.succeeded,
        failed: summary.failed,
        pending: summary.pending,
    });
    report
}
