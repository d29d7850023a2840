//! SQLite side of the harvest: the Android app's Room database, the
//! checkpoint exporter that fills it, and conversion from (and back to) the
//! Namakade scrape database.
//!
//! Built on rusqlite with the bundled SQLite, which includes FTS4.

pub mod convert;
pub mod export;
pub mod schema;
pub mod time;

pub use convert::{
    ConvertStats, CoverageStats, NAMAKADE_BASE_URL, ReverseStats, convert_into, convert_source,
    coverage_stats, genres_from_link_path, reverse_convert, reverse_convert_file,
};
pub use export::{ExportError, ExportOptions, ExportStats, export_checkpoint};
pub use schema::{
    ROOM_IDENTITY_HASH, SchemaError, SchemaVariant, create_fresh, create_schema, open_database,
    open_memory, open_read_only,
};
