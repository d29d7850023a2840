use reel_harvest_db::schema::{create_schema, detect_variant, table_exists};
use reel_harvest_db::{
    ROOM_IDENTITY_HASH, SchemaError, SchemaVariant, create_fresh, open_database, open_memory,
};

fn names(conn: &rusqlite::Connection, kind: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
        .unwrap();
    stmt.query_map([kind], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn room_tables_exist() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    for table in [
        "cached_movies",
        "cached_series",
        "cached_episodes",
        "cached_video_urls",
        "cached_genres",
        "cached_movies_fts",
        "cached_series_fts",
        "cached_episodes_fts",
        "room_master_table",
    ] {
        assert!(table_exists(&conn, table).unwrap(), "missing table {table}");
    }
}

#[test]
fn room_indexes_and_triggers_exist() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    let indexes = names(&conn, "index");
    for index in [
        "index_cached_movies_farsilandUrl",
        "index_cached_series_farsilandUrl",
        "index_cached_episodes_seriesId_season_episode",
        "index_cached_episodes_farsilandUrl",
        "index_cached_episodes_dateAdded",
    ] {
        assert!(indexes.iter().any(|i| i == index), "missing index {index}");
    }

    let triggers = names(&conn, "trigger");
    assert_eq!(triggers.len(), 12);
    assert!(
        triggers.contains(&"room_fts_content_sync_cached_episodes_fts_AFTER_INSERT".to_string())
    );
    assert!(
        triggers.contains(&"room_fts_content_sync_cached_movies_fts_BEFORE_UPDATE".to_string())
    );
}

#[test]
fn room_identity_is_recorded() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    let hash: String = conn
        .query_row("SELECT identity_hash FROM room_master_table WHERE id = 42", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(hash, ROOM_IDENTITY_HASH);
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 3);
}

#[test]
fn schema_is_idempotent() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    create_schema(&conn, SchemaVariant::Room).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM room_master_table", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn basic_variant_has_no_search_tables() {
    let conn = open_memory(SchemaVariant::Basic).unwrap();
    assert!(table_exists(&conn, "cached_video_urls").unwrap());
    assert!(!table_exists(&conn, "cached_genres").unwrap());
    assert!(!table_exists(&conn, "cached_movies_fts").unwrap());
    assert_eq!(detect_variant(&conn).unwrap(), Some(SchemaVariant::Basic));
}

#[test]
fn search_index_follows_title_changes() {
    let conn = open_memory(SchemaVariant::Room).unwrap();
    conn.execute(
        "INSERT INTO cached_movies (id, title, farsilandUrl, dateAdded, lastUpdated)
         VALUES (1, 'Leila', 'https://namakade.com/x/leila', 0, 0)",
        [],
    )
    .unwrap();
    let hits = |term: &str| -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM cached_movies_fts WHERE cached_movies_fts MATCH ?1",
            [term],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(hits("leila"), 1);

    conn.execute("UPDATE cached_movies SET title = 'Gando' WHERE id = 1", [])
        .unwrap();
    assert_eq!(hits("leila"), 0);
    assert_eq!(hits("gando"), 1);

    conn.execute("DELETE FROM cached_movies WHERE id = 1", []).unwrap();
    assert_eq!(hits("gando"), 0);
}

#[test]
fn open_database_rejects_foreign_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.db");
    {
        let conn = open_database(&path, SchemaVariant::Room).unwrap();
        conn.execute(
            "UPDATE room_master_table SET identity_hash = 'other' WHERE id = 42",
            [],
        )
        .unwrap();
    }
    match open_database(&path, SchemaVariant::Room) {
        Err(SchemaError::IdentityMismatch { found, .. }) => assert_eq!(found, "other"),
        other => panic!("expected identity mismatch, got {other:?}"),
    }
}

#[test]
fn create_fresh_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.db");
    std::fs::write(&path, b"not a database").unwrap();

    let conn = create_fresh(&path, SchemaVariant::Room).unwrap();
    assert!(table_exists(&conn, "cached_movies").unwrap());
}
