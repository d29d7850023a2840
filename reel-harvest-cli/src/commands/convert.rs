use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_db::{
    NAMAKADE_BASE_URL, convert_source, coverage_stats, open_read_only, reverse_convert_file,
};

use crate::error::CliError;

fn log_coverage(out: &Path) -> Result<(), CliError> {
    let conn = open_read_only(out).map_err(|e| CliError::database(e.to_string()))?;
    let stats = coverage_stats(&conn).map_err(|e| CliError::database(e.to_string()))?;

    crate::log_blank();
    log::info!("{}", "Coverage".if_supports_color(Stdout, |t| t.bold()));
    log::info!("  Movies:         {:>8}", stats.movies);
    log::info!("  Series:         {:>8}", stats.series);
    log::info!("  Episodes:       {:>8}", stats.episodes);
    log::info!("  Movie videos:   {:>8}", stats.movie_videos);
    log::info!("  Episode videos: {:>8}", stats.episode_videos);
    log::info!(
        "  Episodes w/ video: {:>5}  ({:.1}%)",
        stats.episodes_with_video,
        stats.episode_video_percent()
    );
    log::info!(
        "  Series w/ genres:  {:>5}  ({:.1}%)",
        stats.series_with_genres,
        stats.series_genre_percent()
    );
    Ok(())
}

pub(crate) fn run_convert(
    source: &Path,
    out: &Path,
    show_stats: bool,
    reverse: bool,
) -> Result<(), CliError> {
    if !source.exists() {
        return Err(CliError::database(format!(
            "{} does not exist",
            source.display()
        )));
    }

    if reverse {
        let stats =
            reverse_convert_file(source, out).map_err(|e| CliError::database(e.to_string()))?;
        log::info!(
            "{} Wrote {} movies, {} series and {} episodes to {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            stats.movies,
            stats.series,
            stats.episodes,
            out.display().if_supports_color(Stdout, |t| t.cyan())
        );
        if stats.skipped_episodes > 0 {
            log::warn!("{} orphan episodes were skipped", stats.skipped_episodes);
        }
        return Ok(());
    }

    let stats = convert_source(source, out, NAMAKADE_BASE_URL)
        .map_err(|e| CliError::database(e.to_string()))?;
    log::info!(
        "{} Converted into {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        out.display().if_supports_color(Stdout, |t| t.cyan())
    );
    log::info!("  Movies:         {:>8}", stats.movies);
    log::info!(
        "  Series:         {:>8}  ({} Turkish)",
        stats.series,
        stats.turkish_series
    );
    log::info!("  Episodes:       {:>8}", stats.episodes);
    log::info!(
        "  Video URLs:     {:>8}",
        stats.movie_videos + stats.episode_videos
    );
    log::info!("  Genres:         {:>8}", stats.genres);
    if stats.skipped_episodes > 0 {
        log::warn!(
            "{} episodes without a number were skipped",
            stats.skipped_episodes
        );
    }

    if show_stats {
        log_coverage(out)?;
    }
    Ok(())
}
