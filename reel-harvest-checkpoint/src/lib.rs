//! The durable harvest state: a versioned JSON checkpoint, the store that
//! saves and backs it up, the indexed accumulator a run mutates, and the gap
//! analyzer that turns a checkpoint into outstanding work.

pub mod accumulator;
pub mod checkpoint;
pub mod error;
pub mod export;
pub mod gaps;
pub mod stats;
pub mod store;

pub use accumulator::{Accumulator, Upsert, dedupe_episodes, dedupe_shows};
pub use checkpoint::{CURRENT_SCHEMA_VERSION, Checkpoint, Phase, migrate, now_timestamp};
pub use error::CheckpointError;
pub use export::{CatalogExport, write_catalog_json};
pub use gaps::{
    DEFAULT_VERIFY_THRESHOLD, GapConfig, GapCost, GapReport, ItemGap, SeriesVideoGap,
    ShortfallGap, analyze,
};
pub use stats::CheckpointStats;
pub use store::{BackupOutcome, CheckpointStore};
