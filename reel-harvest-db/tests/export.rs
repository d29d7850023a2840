use reel_harvest_checkpoint::Checkpoint;
use reel_harvest_core::{CatalogItem, Episode, ItemKind, deterministic_id};
use reel_harvest_db::{ExportOptions, SchemaVariant, export_checkpoint, open_memory};
use rusqlite::Connection;

const NOW: i64 = 1_700_000_000_000;

fn options() -> ExportOptions {
    ExportOptions {
        timestamp_ms: Some(NOW),
        ..Default::default()
    }
}

fn checkpoint() -> Checkpoint {
    let mut cp = Checkpoint::new();

    let mut movie = CatalogItem::new(
        "movie-a",
        "Movie A",
        "https://namakade.com/iran-1-movies/drama/movie-a",
        ItemKind::Movie,
    );
    movie.genres = vec!["Drama".into(), "Comedy".into()];
    movie.year = Some(2019);
    movie.video_url = Some("https://media.negahestan.com/movie-a.720p.mp4".into());
    cp.shows.push(movie);

    let mut show = CatalogItem::new(
        "show-a",
        "Show A",
        "https://namakade.com/series/show-a",
        ItemKind::Series,
    );
    show.genres = vec!["Drama".into()];
    cp.shows.push(show);

    for n in 1..=3 {
        let mut ep = Episode::numbered(
            "show-a",
            1,
            n,
            format!("https://namakade.com/series/show-a/episode/{n}"),
        );
        if n == 1 {
            ep.title = Some("Pilot".into());
            ep.video_url = Some("https://media.negahestan.com/show-a/1.mp4".into());
        }
        cp.episodes.push(ep);
    }

    let mut special =
        Episode::numbered("show-a", 1, 1, "https://namakade.com/series/show-a/special");
    special.id = "show-a_special".into();
    special.episode_number = None;
    cp.episodes.push(special);

    cp
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn export_writes_every_table() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    let stats = export_checkpoint(&conn, &checkpoint(), &options()).unwrap();

    assert_eq!(stats.movies, 1);
    assert_eq!(stats.series, 1);
    assert_eq!(stats.episodes, 3);
    assert_eq!(stats.skipped_episodes, 1);
    assert_eq!(stats.video_urls, 2);
    assert_eq!(stats.genres, 2);

    let (title, genres, year): (String, String, i32) = conn
        .query_row(
            "SELECT title, genres, year FROM cached_movies WHERE id = ?1",
            [deterministic_id("movie-a")],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(title, "Movie A");
    assert_eq!(genres, "Drama, Comedy");
    assert_eq!(year, 2019);

    let quality: String = conn
        .query_row(
            "SELECT quality FROM cached_video_urls WHERE contentType = 'movie'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(quality, "720p");
}

#[test]
fn series_totals_count_exported_episodes() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    export_checkpoint(&conn, &checkpoint(), &options()).unwrap();

    let (seasons, episodes): (i64, i64) = conn
        .query_row(
            "SELECT totalSeasons, totalEpisodes FROM cached_series WHERE id = ?1",
            [deterministic_id("show-a")],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((seasons, episodes), (1, 3));

    let titles: Vec<String> = conn
        .prepare("SELECT title FROM cached_episodes ORDER BY episode")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(titles, vec!["Pilot", "Episode 2", "Episode 3"]);

    let episode_id: i64 = conn
        .query_row(
            "SELECT episodeId FROM cached_episodes WHERE episode = 2",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(episode_id, deterministic_id("show-a_ep2"));
    assert_eq!(episode_id, 1_381_089_067);
}

#[test]
fn episode_video_points_at_episode_id() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    export_checkpoint(&conn, &checkpoint(), &options()).unwrap();

    let content_id: i64 = conn
        .query_row(
            "SELECT contentId FROM cached_video_urls WHERE contentType = 'episode'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(content_id, 338_346_618);
}

#[test]
fn export_is_idempotent() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    let cp = checkpoint();
    let first = export_checkpoint(&conn, &cp, &options()).unwrap();
    let second = export_checkpoint(&conn, &cp, &options()).unwrap();
    assert_eq!(first, second);

    assert_eq!(count(&conn, "cached_movies"), 1);
    assert_eq!(count(&conn, "cached_series"), 1);
    assert_eq!(count(&conn, "cached_episodes"), 3);
    assert_eq!(count(&conn, "cached_video_urls"), 2);
    assert_eq!(count(&conn, "cached_genres"), 2);
}

#[test]
fn reexport_keeps_date_added_and_updates_fields() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    let mut cp = checkpoint();
    export_checkpoint(&conn, &cp, &options()).unwrap();

    cp.shows[0].title = "Movie A (Remastered)".into();
    cp.shows[0].discovered_at = Some("2020-01-01T00:00:00+00:00".into());
    let later = ExportOptions {
        timestamp_ms: Some(NOW + 1),
        ..Default::default()
    };
    export_checkpoint(&conn, &cp, &later).unwrap();

    let (title, added, updated): (String, i64, i64) = conn
        .query_row(
            "SELECT title, dateAdded, lastUpdated FROM cached_movies",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(title, "Movie A (Remastered)");
    assert_eq!(added, NOW);
    assert_eq!(updated, NOW + 1);

    let hits: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cached_movies_fts WHERE cached_movies_fts MATCH 'remastered'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(hits, 1);
}

#[test]
fn basic_schema_skips_genres() {
    let conn = open_memory(SchemaVariant::Basic).unwrap();
    let stats = export_checkpoint(&conn, &checkpoint(), &options()).unwrap();
    assert_eq!(stats.genres, 0);
    assert_eq!(stats.episodes, 3);
}

#[test]
fn plain_database_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(export_checkpoint(&conn, &checkpoint(), &options()).is_err());
}
