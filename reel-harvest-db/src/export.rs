//! Write a harvest checkpoint into the app database.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rusqlite::{Connection, params};
use thiserror::Error;

use reel_harvest_checkpoint::Checkpoint;
use reel_harvest_core::{CatalogItem, ContentKind, Episode, Genre, ItemKind, VideoUrl, join_genres};

use crate::schema::{SchemaError, SchemaVariant, detect_variant};
use crate::time::{now_millis, parse_millis};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Database has no app tables")]
    NotAnAppDatabase,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_videos: bool,
    /// Replace `cached_genres` with the genres the checkpoint uses. Ignored
    /// for the basic schema, which has no genres table.
    pub rebuild_genres: bool,
    /// `lastUpdated` for every written row; the current time when `None`.
    pub timestamp_ms: Option<i64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_videos: true,
            rebuild_genres: true,
            timestamp_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub movies: usize,
    pub series: usize,
    pub episodes: usize,
    /// Episodes with no number, or whose series is not in the checkpoint.
    pub skipped_episodes: usize,
    pub video_urls: usize,
    pub genres: usize,
}

/// Upsert every show, episode and resolved video URL of `checkpoint`.
///
/// Rows are keyed by the deterministic IDs, so exporting the same
/// checkpoint twice leaves the database unchanged apart from
/// `lastUpdated`. `dateAdded` of an existing row is never rewritten.
pub fn export_checkpoint(
    conn: &Connection,
    checkpoint: &Checkpoint,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    let variant = detect_variant(conn)?.ok_or(ExportError::NotAnAppDatabase)?;
    let now = options.timestamp_ms.unwrap_or_else(now_millis);
    let mut stats = ExportStats::default();

    let mut by_show: HashMap<&str, Vec<&Episode>> = HashMap::new();
    let shows: HashMap<&str, &CatalogItem> = checkpoint
        .shows
        .iter()
        .map(|s| (s.slug.as_str(), s))
        .collect();
    for ep in &checkpoint.episodes {
        match (ep.episode_number, shows.get(ep.show_id.as_str())) {
            (Some(_), Some(show)) if show.is_series() => {
                by_show.entry(ep.show_id.as_str()).or_default().push(ep)
            }
            _ => stats.skipped_episodes += 1,
        }
    }

    let tx = conn.unchecked_transaction()?;

    for item in &checkpoint.shows {
        let added = item
            .discovered_at
            .as_deref()
            .and_then(parse_millis)
            .unwrap_or(now);
        match item.kind {
            ItemKind::Movie => {
                upsert_movie(&tx, item, added, now)?;
                stats.movies += 1;
                if options.include_videos {
                    if let Some(url) = item.video_url.as_deref().filter(|u| !u.is_empty()) {
                        let video = VideoUrl::detected(item.id(), ContentKind::Movie, url);
                        upsert_video(&tx, &video, now)?;
                        stats.video_urls += 1;
                    }
                }
            }
            ItemKind::Series => {
                let episodes = by_show.get(item.slug.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                upsert_series(&tx, item, episodes, added, now)?;
                stats.series += 1;
                for ep in episodes {
                    upsert_episode(&tx, item, ep, added, now)?;
                    stats.episodes += 1;
                    if options.include_videos {
                        if let Some(url) = ep.video_url.as_deref().filter(|u| !u.is_empty()) {
                            let video =
                                VideoUrl::detected(ep.id_number(), ContentKind::Episode, url);
                            upsert_video(&tx, &video, now)?;
                            stats.video_urls += 1;
                        }
                    }
                }
            }
        }
    }

    if options.rebuild_genres && variant == SchemaVariant::Room {
        stats.genres = rebuild_genres(&tx, checkpoint)?;
    }

    tx.commit()?;
    log::info!(
        "Exported {} movies, {} series, {} episodes, {} video URLs ({} episodes skipped)",
        stats.movies,
        stats.series,
        stats.episodes,
        stats.video_urls,
        stats.skipped_episodes
    );
    Ok(stats)
}

// ── Rows ────────────────────────────────────────────────────────────────────

fn upsert_movie(
    conn: &Connection,
    item: &CatalogItem,
    added: i64,
    now: i64,
) -> Result<(), rusqlite::Error> {
    let id = item.id();
    // A slug change on the site would otherwise trip the unique URL index.
    conn.execute(
        "DELETE FROM cached_movies WHERE farsilandUrl = ?1 AND id != ?2",
        params![item.url, id],
    )?;
    conn.execute(
        "INSERT INTO cached_movies (id, title, posterUrl, farsilandUrl, description, year,
                                    rating, runtime, director, `cast`, genres, dateAdded, lastUpdated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, NULL, NULL, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            posterUrl = COALESCE(excluded.posterUrl, posterUrl),
            farsilandUrl = excluded.farsilandUrl,
            description = COALESCE(excluded.description, description),
            year = COALESCE(excluded.year, year),
            genres = COALESCE(excluded.genres, genres),
            lastUpdated = excluded.lastUpdated",
        params![
            id,
            item.title,
            item.poster,
            item.url,
            item.description,
            item.year,
            join_genres(&item.genres),
            added,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_series(
    conn: &Connection,
    item: &CatalogItem,
    episodes: &[&Episode],
    added: i64,
    now: i64,
) -> Result<(), rusqlite::Error> {
    let id = item.id();
    let seasons: BTreeSet<u32> = episodes.iter().map(|e| e.season).collect();
    let total_seasons = seasons.len().max(1) as i64;
    conn.execute(
        "DELETE FROM cached_series WHERE farsilandUrl = ?1 AND id != ?2",
        params![item.url, id],
    )?;
    conn.execute(
        "INSERT INTO cached_series (id, title, posterUrl, backdropUrl, farsilandUrl, description,
                                    year, rating, totalSeasons, totalEpisodes, `cast`, genres,
                                    dateAdded, lastUpdated)
         VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, NULL, ?7, ?8, NULL, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            posterUrl = COALESCE(excluded.posterUrl, posterUrl),
            farsilandUrl = excluded.farsilandUrl,
            description = COALESCE(excluded.description, description),
            year = COALESCE(excluded.year, year),
            totalSeasons = excluded.totalSeasons,
            totalEpisodes = excluded.totalEpisodes,
            genres = COALESCE(excluded.genres, genres),
            lastUpdated = excluded.lastUpdated",
        params![
            id,
            item.title,
            item.poster,
            item.url,
            item.description,
            item.year,
            total_seasons,
            episodes.len() as i64,
            join_genres(&item.genres),
            added,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_episode(
    conn: &Connection,
    show: &CatalogItem,
    ep: &Episode,
    added: i64,
    now: i64,
) -> Result<(), rusqlite::Error> {
    let Some(number) = ep.episode_number else {
        return Ok(());
    };
    let series_id = show.id();
    let title = ep
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Episode {number}"));

    conn.execute(
        "DELETE FROM cached_episodes
         WHERE farsilandUrl = ?1 AND NOT (seriesId = ?2 AND season = ?3 AND episode = ?4)",
        params![ep.url, series_id, ep.season, number],
    )?;
    conn.execute(
        "INSERT INTO cached_episodes (seriesId, seriesTitle, episodeId, season, episode, title,
                                      description, thumbnailUrl, farsilandUrl, airDate, runtime,
                                      dateAdded, lastUpdated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8, NULL, NULL, ?9, ?10)
         ON CONFLICT(seriesId, season, episode) DO UPDATE SET
            seriesTitle = excluded.seriesTitle,
            episodeId = excluded.episodeId,
            title = excluded.title,
            thumbnailUrl = COALESCE(excluded.thumbnailUrl, thumbnailUrl),
            farsilandUrl = excluded.farsilandUrl,
            lastUpdated = excluded.lastUpdated",
        params![
            series_id,
            show.title,
            ep.id_number(),
            ep.season,
            number,
            title,
            ep.thumbnail,
            ep.url,
            added,
            now,
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_video(
    conn: &Connection,
    video: &VideoUrl,
    cached_at: i64,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO cached_video_urls (contentId, contentType, quality, mp4Url, fileSizeMB, cachedAt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(contentId, contentType, quality) DO UPDATE SET
            mp4Url = excluded.mp4Url,
            fileSizeMB = COALESCE(excluded.fileSizeMB, fileSizeMB),
            cachedAt = excluded.cachedAt",
        params![
            video.content_id,
            video.content_kind.as_str(),
            video.quality,
            video.url,
            video.file_size_mb,
            cached_at,
        ],
    )?;
    Ok(())
}

// ── Genres ──────────────────────────────────────────────────────────────────

fn rebuild_genres(conn: &Connection, checkpoint: &Checkpoint) -> Result<usize, rusqlite::Error> {
    let mut genres: BTreeMap<String, Genre> = BTreeMap::new();
    for name in checkpoint.shows.iter().flat_map(|s| s.genres.iter()) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        genres
            .entry(name.to_lowercase())
            .or_insert_with(|| Genre::from_name(name));
    }

    conn.execute("DELETE FROM cached_genres", [])?;
    let mut stmt =
        conn.prepare("INSERT OR REPLACE INTO cached_genres (id, name, slug) VALUES (?1, ?2, ?3)")?;
    for genre in genres.values() {
        stmt.execute(params![genre.id, genre.name, genre.slug])?;
    }
    Ok(genres.len())
}
