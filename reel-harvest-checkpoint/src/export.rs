use std::path::Path;

use serde::Serialize;

use reel_harvest_core::{CatalogItem, Episode};

use crate::checkpoint::{Checkpoint, now_timestamp};
use crate::error::CheckpointError;

/// The catalog as a standalone JSON document, without run state.
#[derive(Debug, Serialize)]
pub struct CatalogExport<'a> {
    pub shows: &'a [CatalogItem],
    pub episodes: &'a [Episode],
    pub generated_at: String,
}

impl<'a> CatalogExport<'a> {
    pub fn new(checkpoint: &'a Checkpoint) -> Self {
        Self {
            shows: &checkpoint.shows,
            episodes: &checkpoint.episodes,
            generated_at: now_timestamp(),
        }
    }
}

/// Write `{shows, episodes, generated_at}` to `path` (temp file, then rename).
pub fn write_catalog_json(checkpoint: &Checkpoint, path: &Path) -> Result<(), CheckpointError> {
    let json = serde_json::to_vec_pretty(&CatalogExport::new(checkpoint))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
