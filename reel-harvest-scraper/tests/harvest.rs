mod common;

use common::*;
use reel_harvest_checkpoint::{
    Accumulator, Checkpoint, CheckpointStore, GapConfig, Phase, analyze,
};
use reel_harvest_core::Episode;
use reel_harvest_scraper::{
    HarvestContext, HarvestEvent, HarvestOptions, HarvestTask, Harvester, NamakadeSite,
    PlanOptions, TaskState, plan_tasks, run_harvest,
};
use std::time::Duration;
use tokio::sync::mpsc;

fn seeded() -> Checkpoint {
    let mut cp = Checkpoint::new();
    cp.phase = Phase::DetailScraping;
    cp.shows = vec![series("shahrzad"), movie("leila")];
    cp
}

/// Series with three episodes (the third video page is missing) and a movie.
fn catalog_fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .page(&format!("{BASE}/series/shahrzad"), series_page("shahrzad", 3, 3))
        .page(
            &format!("{BASE}/series/shahrzad/episode/1"),
            episode_page("https://media.iranproud2.net/shahrzad/1.mp4"),
        )
        .page(
            &format!("{BASE}/series/shahrzad/episode/2"),
            episode_page("https://media.iranproud2.net/shahrzad/2.mp4"),
        )
        .page(
            &format!("{BASE}/iran-1-movies/drama/leila"),
            movie_page("https://media.iranproud2.net/leila.mp4", "900"),
        )
}

fn options(workers: usize) -> HarvestOptions {
    HarvestOptions {
        workers,
        flush_every: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn harvests_new_items_and_flushes() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let harvester = Harvester::new(catalog_fetcher(), NamakadeSite::default());

    let cp = seeded();
    let tasks = plan_tasks(&analyze(&cp, &GapConfig::default()), &PlanOptions::default());
    assert_eq!(tasks.len(), 2);

    let mut acc = Accumulator::new(cp);
    let ctx = HarvestContext::silent();
    let report = run_harvest(&harvester, tasks, &mut acc, &store, &options(2), &ctx).await;

    let summary = report.summary();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert!(!report.interrupted);
    assert_eq!(report.episodes_inserted, 3);
    assert_eq!(report.videos_resolved, 3);
    assert_eq!(report.flushes, 3);

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.phase, Phase::Complete);
    assert_eq!(saved.last_detail_index, None);

    let leila = saved.shows.iter().find(|s| s.slug == "leila").unwrap();
    assert_eq!(
        leila.video_url.as_deref(),
        Some("https://media.negahestan.com/leila.mp4")
    );
    assert_eq!(leila.view_count, Some(900));

    let ep = |id: &str| saved.episodes.iter().find(|e| e.id == id).cloned().unwrap();
    assert_eq!(
        ep("shahrzad_ep1").video_url.as_deref(),
        Some("https://media.negahestan.com/shahrzad/1.mp4")
    );
    assert_eq!(ep("shahrzad_ep2").episode_number, Some(2));
    assert_eq!(ep("shahrzad_ep3").video_url, None);

    let remaining = analyze(&saved, &GapConfig::default());
    assert!(remaining.new_items().next().is_none());
    let missing: Vec<_> = remaining
        .episodes_missing_video
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(missing, vec!["shahrzad_ep3"]);
}

#[tokio::test]
async fn rerunning_the_same_tasks_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let harvester = Harvester::new(catalog_fetcher(), NamakadeSite::default());
    let ctx = HarvestContext::silent();

    let tasks = vec![
        HarvestTask::ScrapeItem(series("shahrzad")),
        HarvestTask::ScrapeItem(movie("leila")),
    ];
    let mut acc = Accumulator::new(seeded());
    run_harvest(&harvester, tasks.clone(), &mut acc, &store, &options(2), &ctx).await;
    let first = acc.checkpoint().clone();

    let again = run_harvest(&harvester, tasks, &mut acc, &store, &options(2), &ctx).await;
    assert_eq!(again.items_updated, 0);
    assert_eq!(again.episodes_inserted, 0);
    assert_eq!(again.episodes_updated, 0);
    assert_eq!(acc.checkpoint().shows, first.shows);
    assert_eq!(acc.checkpoint().episodes.len(), first.episodes.len());
    for ep in &first.episodes {
        assert_eq!(acc.episode(&ep.id), Some(ep));
    }
}

#[tokio::test]
async fn later_result_for_the_same_episode_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let fetcher = StaticFetcher::new()
        .page(&format!("{BASE}/a"), episode_page("https://cdn.example/a.mp4"))
        .page(&format!("{BASE}/b"), episode_page("https://cdn.example/b.mp4"));
    let harvester = Harvester::new(fetcher, NamakadeSite::default());

    let with_url = |url: &str| Episode::numbered("shahrzad", 1, 1, format!("{BASE}{url}"));
    let tasks = vec![
        HarvestTask::ResolveVideos {
            show_id: "shahrzad".into(),
            episodes: vec![with_url("/a")],
        },
        HarvestTask::ResolveVideos {
            show_id: "shahrzad".into(),
            episodes: vec![with_url("/b")],
        },
    ];

    let mut acc = Accumulator::new(seeded());
    let report = run_harvest(
        &harvester,
        tasks,
        &mut acc,
        &store,
        &options(1),
        &HarvestContext::silent(),
    )
    .await;

    assert_eq!(report.episodes_inserted, 1);
    assert_eq!(report.episodes_updated, 1);
    let ep = acc.episode("shahrzad_ep1").unwrap();
    assert_eq!(ep.video_url.as_deref(), Some("https://cdn.example/b.mp4"));
    assert_eq!(acc.episode_count(), 1);
}

#[tokio::test]
async fn missing_detail_page_fails_only_that_task() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let harvester = Harvester::new(catalog_fetcher(), NamakadeSite::default());

    let mut cp = seeded();
    cp.shows.push(movie("gone"));
    let tasks = plan_tasks(&analyze(&cp, &GapConfig::default()), &PlanOptions::default());
    let mut acc = Accumulator::new(cp);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = HarvestContext::new(tx);
    let report = run_harvest(&harvester, tasks, &mut acc, &store, &options(3), &ctx).await;

    let summary = report.summary();
    assert_eq!((summary.succeeded, summary.failed, summary.pending), (2, 1, 0));
    let failures: Vec<_> = report.failures().map(|(label, _)| label.to_string()).collect();
    assert_eq!(failures, vec!["scrape movie gone"]);
    assert_eq!(acc.checkpoint().phase, Phase::Complete);

    let mut failed_events = 0;
    let mut saw_done = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            HarvestEvent::TaskFailed { label, .. } => {
                assert_eq!(label, "scrape movie gone");
                failed_events += 1;
            }
            HarvestEvent::Done { failed, .. } => {
                assert_eq!(failed, 1);
                saw_done = true;
            }
            _ => {}
        }
    }
    assert_eq!(failed_events, 1);
    assert!(saw_done);
}

#[tokio::test]
async fn stop_before_start_leaves_everything_pending() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let fetcher = catalog_fetcher();
    let harvester = Harvester::new(fetcher, NamakadeSite::default());

    let cp = seeded();
    let tasks = plan_tasks(&analyze(&cp, &GapConfig::default()), &PlanOptions::default());
    let mut acc = Accumulator::new(cp);
    let ctx = HarvestContext::silent();
    ctx.request_stop();

    let report = run_harvest(&harvester, tasks, &mut acc, &store, &options(2), &ctx).await;
    assert!(report.interrupted);
    assert!(report.outcomes.iter().all(|o| o.state == TaskState::Pending));
    assert!(harvester.fetcher().fetched().is_empty());

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.phase, Phase::DetailScraping);
}

#[tokio::test]
async fn stop_mid_run_finishes_in_flight_work_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let ctx = HarvestContext::silent();

    let mut fetcher = StaticFetcher::new();
    let mut cp = Checkpoint::new();
    for n in 1..=5 {
        let m = movie(&format!("m{n}"));
        fetcher = fetcher.page(&m.url, movie_page(&format!("https://cdn.example/m{n}.mp4"), "1"));
        cp.shows.push(m);
    }
    let stopper = ctx.clone();
    let fetcher = fetcher.on_fetch(move |url| {
        if url.ends_with("/m2") {
            stopper.request_stop();
        }
    });
    let harvester = Harvester::new(fetcher, NamakadeSite::default());

    let tasks = plan_tasks(&analyze(&cp, &GapConfig::default()), &PlanOptions::default());
    let mut acc = Accumulator::new(cp);
    let report = run_harvest(&harvester, tasks, &mut acc, &store, &options(1), &ctx).await;

    let summary = report.summary();
    assert_eq!((summary.succeeded, summary.pending), (2, 3));
    assert!(report.interrupted);
    assert_eq!(report.outcomes[2].state, TaskState::Pending);

    let saved = store.load().unwrap().unwrap();
    assert_ne!(saved.phase, Phase::Complete);
    let with_video = saved.shows.iter().filter(|s| s.has_video()).count();
    assert_eq!(with_video, 2);
    assert_eq!(
        analyze(&saved, &GapConfig::default())
            .movies_missing_video
            .len(),
        3
    );
}

#[tokio::test]
async fn verification_fetches_only_new_episode_urls() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));
    let fetcher = StaticFetcher::new()
        .page(&format!("{BASE}/series/shahrzad"), series_page("shahrzad", 4, 4))
        .page(
            &format!("{BASE}/series/shahrzad/episode/3"),
            episode_page("https://cdn.example/3.mp4"),
        )
        .page(
            &format!("{BASE}/series/shahrzad/episode/4"),
            episode_page("https://cdn.example/4.mp4"),
        );
    let harvester = Harvester::new(fetcher, NamakadeSite::default());

    let mut cp = seeded();
    cp.shows[0].total_episodes = Some(4);
    cp.shows[1].video_url = Some("https://cdn.example/leila.mp4".into());
    for n in 1..=2 {
        let mut ep = Episode::numbered(
            "shahrzad",
            1,
            n,
            format!("{BASE}/series/shahrzad/episode/{n}"),
        );
        ep.video_url = Some(format!("https://cdn.example/{n}.mp4"));
        cp.episodes.push(ep);
    }

    let report = analyze(&cp, &GapConfig::default());
    let tasks = plan_tasks(&report, &PlanOptions::verify_only());
    assert_eq!(tasks.len(), 1);

    let mut acc = Accumulator::new(cp);
    let run = run_harvest(
        &harvester,
        tasks,
        &mut acc,
        &store,
        &options(1),
        &HarvestContext::silent(),
    )
    .await;
    assert_eq!(run.episodes_inserted, 2);
    assert_eq!(run.episodes_updated, 0);
    assert_eq!(acc.episode_count(), 4);

    let fetched = harvester.fetcher().fetched();
    assert!(!fetched.iter().any(|u| u.ends_with("/episode/1")));
    assert!(fetched.iter().any(|u| u.ends_with("/episode/4")));
    assert!(
        analyze(acc.checkpoint(), &GapConfig::default())
            .verification_candidates
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn task_out_of_time_keeps_resolved_episodes() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));

    let mut fetcher = StaticFetcher::new().page(
        &format!("{BASE}/series/shahrzad"),
        series_page("shahrzad", 10, 10),
    );
    for n in 1..=10 {
        fetcher = fetcher.page(
            &format!("{BASE}/series/shahrzad/episode/{n}"),
            episode_page(&format!("https://cdn.example/{n}.mp4")),
        );
    }
    let fetcher = fetcher.slow("/episode/", Duration::from_millis(300));
    let harvester = Harvester::new(fetcher, NamakadeSite::default());

    let mut cp = Checkpoint::new();
    cp.shows = vec![series("shahrzad")];
    let mut acc = Accumulator::new(cp);
    let options = HarvestOptions {
        workers: 1,
        flush_every: 1,
        task_timeout: Duration::from_secs(1),
    };
    let report = run_harvest(
        &harvester,
        vec![HarvestTask::ScrapeItem(series("shahrzad"))],
        &mut acc,
        &store,
        &options,
        &HarvestContext::silent(),
    )
    .await;

    // Fetches start at 0, 300, 600 and 900ms; the budget is spent by the fifth.
    assert_eq!(report.summary().succeeded, 1);
    assert_eq!(report.videos_resolved, 4);
    assert_eq!(report.episodes_inserted, 10);

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.episodes.iter().filter(|e| e.has_video()).count(), 4);
    let remaining = analyze(&saved, &GapConfig::default());
    assert_eq!(remaining.episodes_missing_video.len(), 6);
    assert_eq!(remaining.series_missing_video.len(), 1);
}
