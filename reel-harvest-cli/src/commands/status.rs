use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_checkpoint::{
    CheckpointStats, GapConfig, GapCost, GapReport, ShortfallGap, analyze,
};

use super::Session;
use crate::error::CliError;

fn load_checkpoint(
    session: &Session,
) -> Result<Option<reel_harvest_checkpoint::Checkpoint>, CliError> {
    let store = session.store();
    let checkpoint = store
        .load()
        .map_err(|e| CliError::checkpoint(format!("{}: {e}", store.path().display())))?;
    if checkpoint.is_none() {
        log::warn!(
            "No checkpoint at {}; run 'reel-harvest discover' first",
            store.path().display()
        );
    }
    Ok(checkpoint)
}

fn cost_label(cost: GapCost) -> &'static str {
    match cost {
        GapCost::Cheap => "cheap",
        GapCost::Moderate => "moderate",
        GapCost::Expensive => "expensive",
    }
}

/// Show checkpoint statistics and a gap summary.
pub(crate) fn run_status(session: &Session) -> Result<(), CliError> {
    let Some(checkpoint) = load_checkpoint(session)? else {
        return Ok(());
    };
    let stats = CheckpointStats::collect(&checkpoint);

    log::info!("{}", "Checkpoint Status".if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  File:           {}",
        session
            .settings
            .paths
            .checkpoint
            .display()
            .if_supports_color(Stdout, |t| t.cyan())
    );
    log::info!("  Phase:          {}", checkpoint.phase);
    for (label, value) in [
        ("Created:", &checkpoint.created_at),
        ("Updated:", &checkpoint.updated_at),
        ("Discovered:", &checkpoint.discovery_last_run),
        ("Last backup:", &checkpoint.last_backup_at),
    ] {
        if let Some(value) = value {
            log::info!("  {label:<15} {value}");
        }
    }
    crate::log_blank();

    log::info!("  Shows:          {:>8}", stats.shows);
    log::info!("    Series:       {:>8}", stats.series);
    log::info!("    Movies:       {:>8}", stats.movies);
    log::info!(
        "  Movies w/ video:{:>8}  ({:.1}%)",
        stats.movies_with_video,
        stats.movie_video_coverage()
    );
    log::info!(
        "  Series w/ eps:  {:>8}",
        stats.series_with_episodes
    );
    log::info!("  Episodes:       {:>8}", stats.episodes);
    log::info!(
        "  Eps w/ video:   {:>8}  ({:.1}%)",
        stats.episodes_with_video,
        stats.episode_video_coverage()
    );
    if stats.orphan_episodes > 0 {
        log::warn!("{} episodes belong to no known show", stats.orphan_episodes);
    }
    if !stats.by_category.is_empty() {
        crate::log_blank();
        log::info!("  {}", "By category".if_supports_color(Stdout, |t| t.bold()));
        for (category, count) in &stats.by_category {
            log::info!("    {category:<24} {count:>6}");
        }
    }

    let gaps = analyze(&checkpoint, &session.gap_config());
    crate::log_blank();
    log_gap_summary(&gaps);
    Ok(())
}

fn log_gap_summary(gaps: &GapReport) {
    log::info!("{}", "Gaps".if_supports_color(Stdout, |t| t.bold()));
    if gaps.is_empty() && gaps.manual_review.is_empty() {
        log::info!(
            "  {} Nothing outstanding",
            "\u{2714}".if_supports_color(Stdout, |t| t.green())
        );
        return;
    }
    log::info!(
        "  Series without episodes: {:>6}",
        gaps.series_without_episodes.len()
    );
    log::info!(
        "  Movies missing video:    {:>6}",
        gaps.movies_missing_video.len()
    );
    log::info!(
        "  Episodes missing video:  {:>6}  (in {} series)",
        gaps.episodes_missing_video.len(),
        gaps.series_missing_video.len()
    );
    log::info!(
        "  Verification candidates: {:>6}",
        gaps.verification_candidates.len()
    );
    log::info!(
        "  Manual review:           {:>6}",
        gaps.manual_review.len()
    );
    log::info!(
        "  Estimated fetches:       {:>6}",
        gaps.estimated_fetches()
    );

    let breakdown = gaps.cost_breakdown();
    let parts: Vec<String> = [GapCost::Cheap, GapCost::Moderate, GapCost::Expensive]
        .into_iter()
        .filter_map(|cost| {
            breakdown
                .get(&cost)
                .map(|n| format!("{n} {}", cost_label(cost)))
        })
        .collect();
    if !parts.is_empty() {
        log::info!("  By cost:                 {}", parts.join(", "));
    }
}

fn log_shortfalls(title: &str, gaps: &[ShortfallGap], limit: usize) {
    if gaps.is_empty() {
        return;
    }
    crate::log_blank();
    log::info!(
        "{} ({})",
        title.if_supports_color(Stdout, |t| t.bold()),
        gaps.len()
    );
    for gap in gaps.iter().take(limit) {
        log::info!(
            "  {:<40} {:>4}/{:<4} missing {}",
            gap.show.title,
            gap.recorded,
            gap.stated,
            gap.shortfall()
        );
    }
    if gaps.len() > limit {
        log::info!("  ... and {} more", gaps.len() - limit);
    }
}

/// List outstanding gaps section by section.
pub(crate) fn run_gaps(
    session: &Session,
    threshold: Option<u32>,
    limit: usize,
) -> Result<(), CliError> {
    let Some(checkpoint) = load_checkpoint(session)? else {
        return Ok(());
    };
    let config = GapConfig {
        verify_threshold: threshold.unwrap_or(session.settings.harvest.verify_threshold),
    };
    let gaps = analyze(&checkpoint, &config);
    log_gap_summary(&gaps);

    let new_items: Vec<_> = gaps.new_items().collect();
    if !new_items.is_empty() {
        crate::log_blank();
        log::info!(
            "{} ({})",
            "Not yet scraped".if_supports_color(Stdout, |t| t.bold()),
            new_items.len()
        );
        for gap in new_items.iter().take(limit) {
            log::info!(
                "  {:<40} {:<7} ~{} fetches ({})",
                gap.item.title,
                gap.item.kind.as_str(),
                gap.estimated_fetches,
                cost_label(gap.cost)
            );
        }
        if new_items.len() > limit {
            log::info!("  ... and {} more", new_items.len() - limit);
        }
    }

    if !gaps.series_missing_video.is_empty() {
        crate::log_blank();
        log::info!(
            "{} ({})",
            "Series with episodes missing video".if_supports_color(Stdout, |t| t.bold()),
            gaps.series_missing_video.len()
        );
        for gap in gaps.series_missing_video.iter().take(limit) {
            log::info!(
                "  {:<40} {:>4} episodes ({})",
                gap.show_id,
                gap.episodes.len(),
                cost_label(gap.cost)
            );
        }
        if gaps.series_missing_video.len() > limit {
            log::info!("  ... and {} more", gaps.series_missing_video.len() - limit);
        }
    }

    log_shortfalls(
        &format!("Verification candidates (shortfall <= {})", config.verify_threshold),
        &gaps.verification_candidates,
        limit,
    );
    log_shortfalls("Manual review", &gaps.manual_review, limit);
    Ok(())
}
