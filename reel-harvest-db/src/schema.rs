//! SQLite schema creation for the app database and the Namakade source
//! database.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Cannot replace {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Identity mismatch: expected {expected}, found {found}")]
    IdentityMismatch { expected: String, found: String },
}

/// Identity hash Room compares against on open. Must match the app build.
pub const ROOM_IDENTITY_HASH: &str = "farsiland_content_v3";

/// Database version the app's Room declaration carries.
pub const ROOM_VERSION: i32 = 3;

/// Which flavour of the app schema to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVariant {
    /// Everything the app's Room entities declare: genres, FTS4 shadow
    /// tables with their sync triggers, indexes and the master table.
    #[default]
    Room,
    /// The four content tables only, as older converter output had them.
    Basic,
}

impl SchemaVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVariant::Room => "room",
            SchemaVariant::Basic => "basic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "room" => Some(SchemaVariant::Room),
            "basic" => Some(SchemaVariant::Basic),
            _ => None,
        }
    }
}

/// Create all tables for `variant` if they don't exist.
///
/// Idempotent. For [`SchemaVariant::Room`] the master table row and
/// `user_version` are (re)written so Room accepts the file.
pub fn create_schema(conn: &Connection, variant: SchemaVariant) -> Result<(), SchemaError> {
    match variant {
        SchemaVariant::Room => {
            conn.execute_batch(ROOM_SCHEMA_SQL)?;
            conn.execute(
                "INSERT OR REPLACE INTO room_master_table (id, identity_hash) VALUES (42, ?1)",
                [ROOM_IDENTITY_HASH],
            )?;
            conn.pragma_update(None, "user_version", ROOM_VERSION)?;
        }
        SchemaVariant::Basic => conn.execute_batch(BASIC_SCHEMA_SQL)?,
    }
    Ok(())
}

/// Which variant an existing database was written with, by the presence of
/// `room_master_table`. Returns `None` for a file with no app tables.
pub fn detect_variant(conn: &Connection) -> Result<Option<SchemaVariant>, SchemaError> {
    if table_exists(conn, "room_master_table")? {
        Ok(Some(SchemaVariant::Room))
    } else if table_exists(conn, "cached_movies")? {
        Ok(Some(SchemaVariant::Basic))
    } else {
        Ok(None)
    }
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, SchemaError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
        [name],
        |row| row.get(0),
    )?)
}

/// Open an app database, creating the schema when the file is new.
///
/// An existing Room database must carry [`ROOM_IDENTITY_HASH`]; an
/// existing database of the other variant is used as it is.
pub fn open_database(path: &Path, variant: SchemaVariant) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path)?;

    match detect_variant(&conn)? {
        None => create_schema(&conn, variant)?,
        Some(SchemaVariant::Room) => {
            let found: Option<String> = conn
                .query_row(
                    "SELECT identity_hash FROM room_master_table WHERE id = 42",
                    [],
                    |row| row.get(0),
                )
                .ok();
            let found = found.unwrap_or_default();
            if found != ROOM_IDENTITY_HASH {
                return Err(SchemaError::IdentityMismatch {
                    expected: ROOM_IDENTITY_HASH.to_string(),
                    found,
                });
            }
        }
        Some(SchemaVariant::Basic) => {
            if variant == SchemaVariant::Room {
                log::warn!(
                    "{} uses the basic schema; genres and search tables are not written",
                    path.display()
                );
            }
        }
    }

    Ok(conn)
}

/// Delete whatever is at `path` and create an empty database there.
pub fn create_fresh(path: &Path, variant: SchemaVariant) -> Result<Connection, SchemaError> {
    remove_database_files(path)?;
    let conn = Connection::open(path)?;
    create_schema(&conn, variant)?;
    Ok(conn)
}

/// Open an existing database without write access.
pub fn open_read_only(path: &Path) -> Result<Connection, SchemaError> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY,
    )?)
}

/// Remove a database file along with its journal siblings.
pub(crate) fn remove_database_files(path: &Path) -> Result<(), SchemaError> {
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let mut target = path.as_os_str().to_owned();
        target.push(suffix);
        let target = Path::new(&target);
        if target.exists() {
            std::fs::remove_file(target).map_err(|source| SchemaError::Io {
                path: target.display().to_string(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Open an in-memory database with the given schema. Useful for testing.
pub fn open_memory(variant: SchemaVariant) -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn, variant)?;
    Ok(conn)
}

/// Create the Namakade scrape database tables (`series`, `episodes`).
pub fn create_source_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SOURCE_SCHEMA_SQL)?;
    Ok(())
}

/// Tables, indexes and triggers exactly as Room generates them for the
/// app's `ContentDatabase`.
const ROOM_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS `cached_movies` (
    `id` INTEGER PRIMARY KEY NOT NULL,
    `title` TEXT NOT NULL,
    `posterUrl` TEXT,
    `farsilandUrl` TEXT NOT NULL,
    `description` TEXT,
    `year` INTEGER,
    `rating` REAL,
    `runtime` INTEGER,
    `director` TEXT,
    `cast` TEXT,
    `genres` TEXT,
    `dateAdded` INTEGER NOT NULL,
    `lastUpdated` INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS `index_cached_movies_farsilandUrl`
    ON `cached_movies` (`farsilandUrl`);

CREATE TABLE IF NOT EXISTS `cached_series` (
    `id` INTEGER PRIMARY KEY NOT NULL,
    `title` TEXT NOT NULL,
    `posterUrl` TEXT,
    `backdropUrl` TEXT,
    `farsilandUrl` TEXT NOT NULL,
    `description` TEXT,
    `year` INTEGER,
    `rating` REAL,
    `totalSeasons` INTEGER NOT NULL,
    `totalEpisodes` INTEGER NOT NULL,
    `cast` TEXT,
    `genres` TEXT,
    `dateAdded` INTEGER NOT NULL,
    `lastUpdated` INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS `index_cached_series_farsilandUrl`
    ON `cached_series` (`farsilandUrl`);

CREATE TABLE IF NOT EXISTS `cached_episodes` (
    `id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    `seriesId` INTEGER NOT NULL,
    `seriesTitle` TEXT,
    `episodeId` INTEGER NOT NULL,
    `season` INTEGER NOT NULL,
    `episode` INTEGER NOT NULL,
    `title` TEXT NOT NULL,
    `description` TEXT,
    `thumbnailUrl` TEXT,
    `farsilandUrl` TEXT NOT NULL,
    `airDate` TEXT,
    `runtime` INTEGER,
    `dateAdded` INTEGER NOT NULL,
    `lastUpdated` INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS `index_cached_episodes_seriesId_season_episode`
    ON `cached_episodes` (`seriesId`, `season`, `episode`);
CREATE UNIQUE INDEX IF NOT EXISTS `index_cached_episodes_farsilandUrl`
    ON `cached_episodes` (`farsilandUrl`);
CREATE INDEX IF NOT EXISTS `index_cached_episodes_dateAdded`
    ON `cached_episodes` (`dateAdded`);

CREATE TABLE IF NOT EXISTS `cached_video_urls` (
    `id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    `contentId` INTEGER NOT NULL,
    `contentType` TEXT NOT NULL,
    `quality` TEXT NOT NULL,
    `mp4Url` TEXT NOT NULL,
    `fileSizeMB` REAL,
    `cachedAt` INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS `index_cached_video_urls_contentId_contentType_quality`
    ON `cached_video_urls` (`contentId`, `contentType`, `quality`);

CREATE TABLE IF NOT EXISTS `cached_genres` (
    `id` INTEGER PRIMARY KEY NOT NULL,
    `name` TEXT NOT NULL,
    `slug` TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS `cached_movies_fts`
    USING FTS4(`title` TEXT NOT NULL, content=`cached_movies`);
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_movies_fts_BEFORE_UPDATE
    BEFORE UPDATE ON `cached_movies` BEGIN
    DELETE FROM `cached_movies_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_movies_fts_BEFORE_DELETE
    BEFORE DELETE ON `cached_movies` BEGIN
    DELETE FROM `cached_movies_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_movies_fts_AFTER_UPDATE
    AFTER UPDATE ON `cached_movies` BEGIN
    INSERT INTO `cached_movies_fts`(`docid`, `title`) VALUES (NEW.`rowid`, NEW.`title`);
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_movies_fts_AFTER_INSERT
    AFTER INSERT ON `cached_movies` BEGIN
    INSERT INTO `cached_movies_fts`(`docid`, `title`) VALUES (NEW.`rowid`, NEW.`title`);
END;

CREATE VIRTUAL TABLE IF NOT EXISTS `cached_series_fts`
    USING FTS4(`title` TEXT NOT NULL, content=`cached_series`);
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_series_fts_BEFORE_UPDATE
    BEFORE UPDATE ON `cached_series` BEGIN
    DELETE FROM `cached_series_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_series_fts_BEFORE_DELETE
    BEFORE DELETE ON `cached_series` BEGIN
    DELETE FROM `cached_series_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_series_fts_AFTER_UPDATE
    AFTER UPDATE ON `cached_series` BEGIN
    INSERT INTO `cached_series_fts`(`docid`, `title`) VALUES (NEW.`rowid`, NEW.`title`);
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_series_fts_AFTER_INSERT
    AFTER INSERT ON `cached_series` BEGIN
    INSERT INTO `cached_series_fts`(`docid`, `title`) VALUES (NEW.`rowid`, NEW.`title`);
END;

CREATE VIRTUAL TABLE IF NOT EXISTS `cached_episodes_fts`
    USING FTS4(`seriesTitle` TEXT, `title` TEXT NOT NULL, content=`cached_episodes`);
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_episodes_fts_BEFORE_UPDATE
    BEFORE UPDATE ON `cached_episodes` BEGIN
    DELETE FROM `cached_episodes_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_episodes_fts_BEFORE_DELETE
    BEFORE DELETE ON `cached_episodes` BEGIN
    DELETE FROM `cached_episodes_fts` WHERE `docid`=OLD.`rowid`;
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_episodes_fts_AFTER_UPDATE
    AFTER UPDATE ON `cached_episodes` BEGIN
    INSERT INTO `cached_episodes_fts`(`docid`, `seriesTitle`, `title`)
        VALUES (NEW.`rowid`, NEW.`seriesTitle`, NEW.`title`);
END;
CREATE TRIGGER IF NOT EXISTS room_fts_content_sync_cached_episodes_fts_AFTER_INSERT
    AFTER INSERT ON `cached_episodes` BEGIN
    INSERT INTO `cached_episodes_fts`(`docid`, `seriesTitle`, `title`)
        VALUES (NEW.`rowid`, NEW.`seriesTitle`, NEW.`title`);
END;

CREATE TABLE IF NOT EXISTS room_master_table (
    id INTEGER PRIMARY KEY,
    identity_hash TEXT
);
"#;

const BASIC_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cached_movies (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    posterUrl TEXT,
    farsilandUrl TEXT NOT NULL UNIQUE,
    description TEXT,
    year INTEGER,
    rating REAL,
    runtime INTEGER,
    director TEXT,
    `cast` TEXT,
    genres TEXT,
    dateAdded INTEGER NOT NULL,
    lastUpdated INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cached_series (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    posterUrl TEXT,
    backdropUrl TEXT,
    farsilandUrl TEXT NOT NULL UNIQUE,
    description TEXT,
    year INTEGER,
    rating REAL,
    totalSeasons INTEGER NOT NULL,
    totalEpisodes INTEGER NOT NULL,
    `cast` TEXT,
    genres TEXT,
    dateAdded INTEGER NOT NULL,
    lastUpdated INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cached_episodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    seriesId INTEGER NOT NULL,
    seriesTitle TEXT,
    episodeId INTEGER NOT NULL,
    season INTEGER NOT NULL,
    episode INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    thumbnailUrl TEXT,
    farsilandUrl TEXT NOT NULL UNIQUE,
    airDate TEXT,
    runtime INTEGER,
    dateAdded INTEGER NOT NULL,
    lastUpdated INTEGER NOT NULL,
    UNIQUE(seriesId, season, episode)
);

CREATE TABLE IF NOT EXISTS cached_video_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    contentId INTEGER NOT NULL,
    contentType TEXT NOT NULL,
    quality TEXT NOT NULL,
    mp4Url TEXT NOT NULL,
    fileSizeMB REAL,
    cachedAt INTEGER NOT NULL,
    UNIQUE(contentId, contentType, quality)
);
"#;

/// The scrape database the Namakade crawler writes. Movies and series
/// share `series`, told apart by `contentType`; a movie's stream is its
/// single row in `episodes`. Timestamps are epoch milliseconds.
const SOURCE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS series (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    slug TEXT NOT NULL,
    linkPath TEXT NOT NULL,
    thumbnail TEXT,
    banner TEXT,
    description TEXT,
    genre TEXT,
    totalEpisodes INTEGER,
    seasons INTEGER,
    year INTEGER,
    rating REAL,
    isTurkish INTEGER NOT NULL DEFAULT 0,
    contentType TEXT NOT NULL DEFAULT 'series',
    createdAt INTEGER,
    updatedAt INTEGER
);

CREATE TABLE IF NOT EXISTS episodes (
    id TEXT PRIMARY KEY NOT NULL,
    seriesId TEXT NOT NULL,
    title TEXT,
    episodeNumber INTEGER,
    season INTEGER NOT NULL DEFAULT 1,
    thumbnail TEXT,
    videoUrl TEXT,
    duration INTEGER,
    addedAt INTEGER,
    episodePageUrl TEXT
);
CREATE INDEX IF NOT EXISTS idx_episodes_series ON episodes(seriesId);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names() {
        assert_eq!(SchemaVariant::parse("Room"), Some(SchemaVariant::Room));
        assert_eq!(SchemaVariant::parse("basic"), Some(SchemaVariant::Basic));
        assert_eq!(SchemaVariant::parse("full"), None);
        assert_eq!(SchemaVariant::default().as_str(), "room");
    }
}
