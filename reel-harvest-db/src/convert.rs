//! Conversion between the Namakade scrape database and the app database.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use reel_harvest_core::{
    ContentKind, Genre, VideoUrl, deterministic_id, path_of, query_value, slug_from_url,
    split_genres,
};

use crate::export::{ExportError, upsert_video};
use crate::schema::{
    SchemaVariant, create_fresh, create_source_schema, open_read_only, remove_database_files,
    table_exists,
};
use crate::time::{millis_value, now_millis};

pub const NAMAKADE_BASE_URL: &str = "https://namakade.com";

const UNKNOWN_GENRE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub movies: usize,
    pub series: usize,
    pub turkish_series: usize,
    pub episodes: usize,
    /// Episodes without a number, which the app cannot place.
    pub skipped_episodes: usize,
    pub movie_videos: usize,
    pub episode_videos: usize,
    pub genres: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseStats {
    pub movies: usize,
    pub series: usize,
    pub episodes: usize,
    /// Episodes whose series row is missing.
    pub skipped_episodes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageStats {
    pub movies: u64,
    pub series: u64,
    pub episodes: u64,
    pub movie_videos: u64,
    pub episode_videos: u64,
    pub episodes_with_video: u64,
    pub series_with_genres: u64,
}

impl CoverageStats {
    pub fn episode_video_percent(&self) -> f64 {
        percent(self.episodes_with_video, self.episodes)
    }

    pub fn series_genre_percent(&self) -> f64 {
        percent(self.series_with_genres, self.series)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// `/iran-1-movies/action-comedy/slug` → `"Action, Comedy"`.
pub fn genres_from_link_path(link_path: &str) -> Option<String> {
    let mut parts = link_path.trim_matches('/').split('/');
    if parts.next() != Some("iran-1-movies") {
        return None;
    }
    let genre_part = parts.next().filter(|p| !p.is_empty())?;
    // Needs a slug after the genre segment.
    parts.next()?;
    let names: Vec<String> = genre_part
        .split('-')
        .filter(|g| !g.is_empty())
        .map(capitalize)
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn url_path(url: &str) -> String {
    path_of(url).unwrap_or_else(|| url.to_string())
}

fn timestamp(row: &Row<'_>, idx: usize, fallback: i64) -> Result<i64, rusqlite::Error> {
    Ok(millis_value(row.get_ref(idx)?).unwrap_or(fallback))
}

// ── Source → app ────────────────────────────────────────────────────────────

/// Convert the scrape database at `source` into a fresh Room app database
/// at `dest`. Anything already at `dest` is replaced.
pub fn convert_source(
    source: &Path,
    dest: &Path,
    base_url: &str,
) -> Result<ConvertStats, ExportError> {
    let src = open_read_only(source)?;
    let out = create_fresh(dest, SchemaVariant::Room)?;
    convert_into(&src, &out, base_url)
}

/// Convert between two open connections. `dest` must already carry an app
/// schema.
pub fn convert_into(
    src: &Connection,
    dest: &Connection,
    base_url: &str,
) -> Result<ConvertStats, ExportError> {
    let base = base_url.trim_end_matches('/');
    let now = now_millis();
    let mut stats = ConvertStats::default();
    let tx = dest.unchecked_transaction()?;

    convert_movies(src, &tx, base, now, &mut stats)?;
    convert_series(src, &tx, base, now, &mut stats)?;
    convert_episodes(src, &tx, base, now, &mut stats)?;
    if table_exists(&tx, "cached_genres")? {
        stats.genres = rebuild_genres_from_content(&tx)?;
    }

    tx.commit()?;
    log::info!(
        "Converted {} movies, {} series ({} Turkish), {} episodes",
        stats.movies,
        stats.series,
        stats.turkish_series,
        stats.episodes
    );
    Ok(stats)
}

fn convert_movies(
    src: &Connection,
    dest: &Connection,
    base: &str,
    now: i64,
    stats: &mut ConvertStats,
) -> Result<(), ExportError> {
    let mut stmt = src.prepare(
        "SELECT id, slug, title, linkPath, thumbnail, description, genre, year, rating,
                createdAt, updatedAt
         FROM series WHERE contentType = 'movie' ORDER BY id",
    )?;
    let mut video_stmt = src.prepare(
        "SELECT videoUrl FROM episodes
         WHERE seriesId = ?1 AND videoUrl IS NOT NULL AND videoUrl != '' LIMIT 1",
    )?;

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let slug: String = row.get(1)?;
        let title: String = row.get(2)?;
        let link_path: String = row.get(3)?;
        let genre: Option<String> = row.get(6)?;
        let created = timestamp(row, 9, now)?;
        let updated = timestamp(row, 10, created)?;

        let genres = genres_from_link_path(&link_path)
            .or_else(|| genre.filter(|g| !g.is_empty() && g != UNKNOWN_GENRE));
        let id = deterministic_id(&slug);

        dest.execute(
            "INSERT OR REPLACE INTO cached_movies (id, title, posterUrl, farsilandUrl, description,
                                                   year, rating, runtime, director, `cast`, genres,
                                                   dateAdded, lastUpdated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, NULL, ?8, ?9, ?10)",
            params![
                id,
                title,
                row.get::<_, Option<String>>(4)?,
                format!("{base}{link_path}"),
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<i32>>(7)?,
                row.get::<_, Option<f64>>(8)?,
                genres,
                created,
                updated,
            ],
        )?;
        stats.movies += 1;

        let video: Option<String> = video_stmt
            .query_row([&key], |r| r.get(0))
            .optional()?;
        if let Some(url) = video {
            let video = VideoUrl {
                content_id: id,
                content_kind: ContentKind::Movie,
                quality: "auto".to_string(),
                url,
                file_size_mb: None,
            };
            upsert_video(dest, &video, created)?;
            stats.movie_videos += 1;
        }
    }
    Ok(())
}

fn convert_series(
    src: &Connection,
    dest: &Connection,
    base: &str,
    now: i64,
    stats: &mut ConvertStats,
) -> Result<(), ExportError> {
    let mut stmt = src.prepare(
        "SELECT s.slug, s.title, s.linkPath, s.thumbnail, s.banner, s.description, s.genre,
                s.seasons, s.year, s.rating, s.isTurkish, s.createdAt, s.updatedAt,
                (SELECT COUNT(*) FROM episodes e WHERE e.seriesId = s.id)
         FROM series s WHERE s.contentType = 'series' ORDER BY s.id",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let slug: String = row.get(0)?;
        let link_path: String = row.get(2)?;
        let genre: Option<String> = row.get(6)?;
        let turkish = row.get::<_, Option<bool>>(10)?.unwrap_or(false);
        let created = timestamp(row, 11, now)?;
        let updated = timestamp(row, 12, created)?;
        let total_episodes: i64 = row.get(13)?;

        let mut genres = Vec::new();
        if turkish {
            genres.push("Turkish".to_string());
            stats.turkish_series += 1;
        }
        if let Some(g) = genre.filter(|g| !g.is_empty() && g != UNKNOWN_GENRE) {
            genres.push(g);
        }
        let genres = (!genres.is_empty()).then(|| genres.join(", "));

        dest.execute(
            "INSERT OR REPLACE INTO cached_series (id, title, posterUrl, backdropUrl, farsilandUrl,
                                                   description, year, rating, totalSeasons,
                                                   totalEpisodes, `cast`, genres, dateAdded,
                                                   lastUpdated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11, ?12, ?13)",
            params![
                deterministic_id(&slug),
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                format!("{base}{link_path}"),
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<i32>>(8)?,
                row.get::<_, Option<f64>>(9)?,
                row.get::<_, Option<i64>>(7)?.unwrap_or(1),
                total_episodes,
                genres,
                created,
                updated,
            ],
        )?;
        stats.series += 1;
    }
    Ok(())
}

fn convert_episodes(
    src: &Connection,
    dest: &Connection,
    base: &str,
    now: i64,
    stats: &mut ConvertStats,
) -> Result<(), ExportError> {
    let mut stmt = src.prepare(
        "SELECT e.id, s.slug, e.title, e.episodeNumber, e.season, e.thumbnail, e.videoUrl,
                e.duration, e.addedAt, e.episodePageUrl, s.title
         FROM episodes e JOIN series s ON e.seriesId = s.id
         WHERE s.contentType = 'series'
         ORDER BY s.id, e.season, e.episodeNumber",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let episode_slug: String = row.get(0)?;
        let series_slug: String = row.get(1)?;
        let Some(number) = row.get::<_, Option<u32>>(3)? else {
            stats.skipped_episodes += 1;
            continue;
        };
        let page_url: Option<String> = row.get(9)?;
        let added = timestamp(row, 8, now)?;
        let episode_id = deterministic_id(&episode_slug);

        let url = match page_url.filter(|p| !p.is_empty()) {
            Some(page) => format!("{base}{page}?ep={episode_slug}"),
            None => format!("{base}/series/{series_slug}/episode/{number}?ep={episode_slug}"),
        };
        let title = row
            .get::<_, Option<String>>(2)?
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Episode {number}"));

        dest.execute(
            "INSERT OR REPLACE INTO cached_episodes (seriesId, seriesTitle, episodeId, season,
                                                     episode, title, description, thumbnailUrl,
                                                     farsilandUrl, airDate, runtime, dateAdded,
                                                     lastUpdated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8, NULL, ?9, ?10, ?10)",
            params![
                deterministic_id(&series_slug),
                row.get::<_, Option<String>>(10)?,
                episode_id,
                row.get::<_, Option<u32>>(4)?.unwrap_or(1),
                number,
                title,
                row.get::<_, Option<String>>(5)?,
                url,
                row.get::<_, Option<i64>>(7)?,
                added,
            ],
        )?;
        stats.episodes += 1;

        if let Some(video) = row.get::<_, Option<String>>(6)?.filter(|v| !v.is_empty()) {
            let video = VideoUrl {
                content_id: episode_id,
                content_kind: ContentKind::Episode,
                quality: "auto".to_string(),
                url: video,
                file_size_mb: None,
            };
            upsert_video(dest, &video, added)?;
            stats.episode_videos += 1;
        }
    }
    Ok(())
}

fn rebuild_genres_from_content(conn: &Connection) -> Result<usize, rusqlite::Error> {
    let mut genres: BTreeMap<String, Genre> = BTreeMap::new();
    for table in ["cached_movies", "cached_series"] {
        let mut stmt = conn.prepare(&format!(
            "SELECT genres FROM {table} WHERE genres IS NOT NULL"
        ))?;
        let values = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for value in values {
            for name in split_genres(&value?) {
                genres
                    .entry(name.to_lowercase())
                    .or_insert_with(|| Genre::from_name(&name));
            }
        }
    }

    conn.execute("DELETE FROM cached_genres", [])?;
    let mut stmt =
        conn.prepare("INSERT OR REPLACE INTO cached_genres (id, name, slug) VALUES (?1, ?2, ?3)")?;
    for genre in genres.values() {
        stmt.execute(params![genre.id, genre.name, genre.slug])?;
    }
    Ok(genres.len())
}

// ── App → source ────────────────────────────────────────────────────────────

/// Map the app database at `app` back into a fresh scrape database at
/// `dest`, replacing anything already there.
pub fn reverse_convert_file(app: &Path, dest: &Path) -> Result<ReverseStats, ExportError> {
    let src = open_read_only(app)?;
    remove_database_files(dest)?;
    let out = Connection::open(dest)?;
    reverse_convert(&src, &out)
}

/// Map an app database back into the scrape database shape, creating the
/// source tables in `dest`.
///
/// Title, URL and year survive a round trip through [`convert_into`]
/// unchanged. Fields the app never stored (banner for movies, the
/// Turkish flag beyond the genre tag) come back `NULL` or default.
pub fn reverse_convert(app: &Connection, dest: &Connection) -> Result<ReverseStats, ExportError> {
    create_source_schema(dest)?;
    let mut stats = ReverseStats::default();
    let tx = dest.unchecked_transaction()?;

    let mut video_stmt = app.prepare(
        "SELECT mp4Url FROM cached_video_urls
         WHERE contentId = ?1 AND contentType = ?2 ORDER BY quality LIMIT 1",
    )?;

    let mut stmt = app.prepare(
        "SELECT id, title, posterUrl, farsilandUrl, description, year, rating, genres,
                dateAdded, lastUpdated
         FROM cached_movies ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let url: String = row.get(3)?;
        let slug = slug_from_url(&url).unwrap_or_else(|| id.to_string());
        let added: i64 = row.get(8)?;

        tx.execute(
            "INSERT OR REPLACE INTO series (id, title, slug, linkPath, thumbnail, banner,
                                            description, genre, totalEpisodes, seasons, year,
                                            rating, isTurkish, contentType, createdAt, updatedAt)
             VALUES (?1, ?2, ?1, ?3, ?4, NULL, ?5, ?6, 1, NULL, ?7, ?8, 0, 'movie', ?9, ?10)",
            params![
                slug,
                row.get::<_, String>(1)?,
                url_path(&url),
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<i32>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                added,
                row.get::<_, i64>(9)?,
            ],
        )?;
        let video: Option<String> = video_stmt
            .query_row(params![id, ContentKind::Movie.as_str()], |r| r.get(0))
            .optional()?;
        if let Some(video) = video {
            tx.execute(
                "INSERT OR REPLACE INTO episodes (id, seriesId, title, episodeNumber, season,
                                                  videoUrl, addedAt)
                 VALUES (?1, ?2, ?3, 1, 1, ?4, ?5)",
                params![format!("{slug}_movie"), slug, row.get::<_, String>(1)?, video, added],
            )?;
        }
        stats.movies += 1;
    }

    let mut series_slugs: HashMap<i64, String> = HashMap::new();
    let mut stmt = app.prepare(
        "SELECT id, title, posterUrl, backdropUrl, farsilandUrl, description, year, rating,
                totalSeasons, totalEpisodes, genres, dateAdded, lastUpdated
         FROM cached_series ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let url: String = row.get(4)?;
        let slug = slug_from_url(&url).unwrap_or_else(|| id.to_string());

        let mut genres = row
            .get::<_, Option<String>>(10)?
            .map(|g| split_genres(&g))
            .unwrap_or_default();
        let turkish = genres.first().is_some_and(|g| g == "Turkish");
        if turkish {
            genres.remove(0);
        }
        let genre = (!genres.is_empty()).then(|| genres.join(", "));

        tx.execute(
            "INSERT OR REPLACE INTO series (id, title, slug, linkPath, thumbnail, banner,
                                            description, genre, totalEpisodes, seasons, year,
                                            rating, isTurkish, contentType, createdAt, updatedAt)
             VALUES (?1, ?2, ?1, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'series', ?13, ?14)",
            params![
                slug,
                row.get::<_, String>(1)?,
                url_path(&url),
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(5)?,
                genre,
                row.get::<_, i64>(9)?,
                row.get::<_, i64>(8)?,
                row.get::<_, Option<i32>>(6)?,
                row.get::<_, Option<f64>>(7)?,
                turkish,
                row.get::<_, i64>(11)?,
                row.get::<_, i64>(12)?,
            ],
        )?;
        series_slugs.insert(id, slug);
        stats.series += 1;
    }

    let mut stmt = app.prepare(
        "SELECT seriesId, episodeId, season, episode, title, thumbnailUrl, farsilandUrl,
                runtime, dateAdded
         FROM cached_episodes ORDER BY seriesId, season, episode",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let series_id: i64 = row.get(0)?;
        let Some(series_slug) = series_slugs.get(&series_id) else {
            stats.skipped_episodes += 1;
            continue;
        };
        let episode_id: i64 = row.get(1)?;
        let url: String = row.get(6)?;
        let number: u32 = row.get(3)?;
        let slug = query_value(&url, "ep")
            .or_else(|| slug_from_url(&url).map(|s| format!("{series_slug}-{s}")))
            .unwrap_or_else(|| format!("{series_slug}-{number}"));
        let video: Option<String> = video_stmt
            .query_row(params![episode_id, ContentKind::Episode.as_str()], |r| r.get(0))
            .optional()?;

        tx.execute(
            "INSERT OR REPLACE INTO episodes (id, seriesId, title, episodeNumber, season,
                                              thumbnail, videoUrl, duration, addedAt,
                                              episodePageUrl)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                slug,
                series_slug,
                row.get::<_, String>(4)?,
                number,
                row.get::<_, u32>(2)?,
                row.get::<_, Option<String>>(5)?,
                video,
                row.get::<_, Option<i64>>(7)?,
                row.get::<_, i64>(8)?,
                url_path(&url),
            ],
        )?;
        stats.episodes += 1;
    }

    tx.commit()?;
    Ok(stats)
}

// ── Coverage ────────────────────────────────────────────────────────────────

/// Row counts plus how much of the catalog has playable video and genres.
pub fn coverage_stats(conn: &Connection) -> Result<CoverageStats, ExportError> {
    let count = |sql: &str| -> Result<u64, rusqlite::Error> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
    };

    Ok(CoverageStats {
        movies: count("SELECT COUNT(*) FROM cached_movies")?,
        series: count("SELECT COUNT(*) FROM cached_series")?,
        episodes: count("SELECT COUNT(*) FROM cached_episodes")?,
        movie_videos: count("SELECT COUNT(*) FROM cached_video_urls WHERE contentType = 'movie'")?,
        episode_videos: count(
            "SELECT COUNT(*) FROM cached_video_urls WHERE contentType = 'episode'",
        )?,
        episodes_with_video: count(
            "SELECT COUNT(*) FROM cached_episodes e WHERE EXISTS (
                SELECT 1 FROM cached_video_urls v
                WHERE v.contentId = e.episodeId AND v.contentType = 'episode')",
        )?,
        series_with_genres: count(
            "SELECT COUNT(*) FROM cached_series WHERE genres IS NOT NULL AND genres != 'Unknown'",
        )?,
    })
}
