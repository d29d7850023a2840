//! Checkpoint document and its schema migrations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use reel_harvest_core::{CatalogItem, Episode, title_from_slug};

use crate::error::CheckpointError;

/// Version written by this build. Files without a `schema_version` key are
/// version 0.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Where a harvest stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    CatalogDiscovery,
    DetailScraping,
    Complete,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::CatalogDiscovery => "catalog_discovery",
            Phase::DetailScraping => "detail_scraping",
            Phase::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "catalog_discovery" => Some(Phase::CatalogDiscovery),
            "detail_scraping" => Some(Phase::DetailScraping),
            "complete" => Some(Phase::Complete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local time in the ISO form existing checkpoints use.
pub fn now_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub schema_version: u32,
    #[serde(default)]
    pub shows: Vec<CatalogItem>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_last_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detail_index: Option<usize>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            shows: Vec::new(),
            episodes: Vec::new(),
            phase: Phase::CatalogDiscovery,
            created_at: None,
            discovery_last_run: None,
            last_backup_at: None,
            updated_at: None,
            last_detail_index: None,
        }
    }
}

impl Checkpoint {
    /// An empty checkpoint stamped with its creation time.
    pub fn new() -> Self {
        Self {
            created_at: Some(now_timestamp()),
            ..Self::default()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(now_timestamp());
    }

    pub fn episodes_for<'a>(&'a self, show_id: &'a str) -> impl Iterator<Item = &'a Episode> + 'a {
        self.episodes.iter().filter(move |e| e.show_id == show_id)
    }

    pub fn from_json(text: &str) -> Result<Self, CheckpointError> {
        let value: Value = serde_json::from_str(text)?;
        migrate(value)
    }
}

/// Bring a raw checkpoint document up to [`CURRENT_SCHEMA_VERSION`].
pub fn migrate(mut value: Value) -> Result<Checkpoint, CheckpointError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| CheckpointError::Malformed("top level is not an object".into()))?;

    let version = match obj.get("schema_version") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().ok_or_else(|| {
            CheckpointError::Malformed(format!("schema_version is not a number: {v}"))
        })?,
    };
    if version > u64::from(CURRENT_SCHEMA_VERSION) {
        return Err(CheckpointError::UnsupportedVersion {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if version == 0 {
        migrate_v0(obj);
    }

    Ok(serde_json::from_value(value)?)
}

/// Version 0 is the unversioned shape written before `schema_version`
/// existed. Arrays may be missing, the phase may be an unknown string, and
/// individual records may lack keys that are now required.
fn migrate_v0(obj: &mut Map<String, Value>) {
    for key in ["shows", "episodes"] {
        if !obj.get(key).is_some_and(Value::is_array) {
            obj.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }

    let mut dropped = 0usize;
    if let Some(Value::Array(shows)) = obj.get_mut("shows") {
        let before = shows.len();
        shows.retain(|s| has_str(s, "id") && has_str(s, "url") && has_str(s, "type"));
        dropped += before - shows.len();
        for rec in shows.iter_mut().filter_map(Value::as_object_mut) {
            if rec.get("title").is_some_and(Value::is_string) {
                continue;
            }
            let slug = rec.get("id").and_then(Value::as_str).unwrap_or_default();
            let title = title_from_slug(slug);
            rec.insert("title".into(), Value::String(title));
        }
    }
    if let Some(Value::Array(episodes)) = obj.get_mut("episodes") {
        let before = episodes.len();
        episodes.retain(|e| has_str(e, "id") && has_str(e, "show_id") && has_str(e, "url"));
        dropped += before - episodes.len();
    }
    if dropped > 0 {
        log::warn!("Checkpoint migration dropped {dropped} records without id/url");
    }

    let has_shows = obj
        .get("shows")
        .and_then(Value::as_array)
        .is_some_and(|s| !s.is_empty());
    let phase = obj.get("phase").and_then(Value::as_str).and_then(Phase::parse);
    let phase = match phase {
        Some(p) => p,
        None if has_shows => Phase::DetailScraping,
        None => Phase::CatalogDiscovery,
    };
    obj.insert("phase".into(), Value::String(phase.as_str().into()));
    obj.insert("schema_version".into(), Value::from(CURRENT_SCHEMA_VERSION));
}

fn has_str(v: &Value, key: &str) -> bool {
    v.get(key).is_some_and(Value::is_string)
}
