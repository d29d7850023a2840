use serde::{Deserialize, Serialize};

use crate::ids::deterministic_id;
use crate::lenient;

/// Discriminates which child structure applies to a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Movie,
    Series,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Movie => "movie",
            ItemKind::Series => "series",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A show or movie discovered on a catalog site.
///
/// Serialized with the key names existing checkpoints use (`id` for the slug,
/// `type` for the kind) so old files load without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Site-specific natural key, usually the last URL path segment.
    #[serde(rename = "id")]
    pub slug: String,
    pub title: String,
    /// Canonical page URL. Unique within a kind.
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub poster: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Episode total as stated by the catalog, which may be inflated.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_episodes: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub view_count: Option<u64>,
    /// Resolved media URL. Only meaningful for movies.
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub discovered_at: Option<String>,
}

impl CatalogItem {
    /// A bare item as produced by a listing page.
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        kind: ItemKind,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            url: url.into(),
            kind,
            poster: None,
            category: None,
            genres: Vec::new(),
            year: None,
            description: None,
            total_episodes: None,
            view_count: None,
            video_url: None,
            discovered_at: None,
        }
    }

    pub fn id(&self) -> i64 {
        deterministic_id(&self.slug)
    }

    pub fn is_series(&self) -> bool {
        self.kind == ItemKind::Series
    }

    pub fn has_video(&self) -> bool {
        self.video_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Fill fields that are absent here from `other`, keeping values already set.
    pub fn absorb(&mut self, other: &CatalogItem) {
        fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if dst.is_none() {
                dst.clone_from(src);
            }
        }
        fill(&mut self.poster, &other.poster);
        fill(&mut self.category, &other.category);
        fill(&mut self.year, &other.year);
        fill(&mut self.description, &other.description);
        fill(&mut self.total_episodes, &other.total_episodes);
        fill(&mut self.view_count, &other.view_count);
        fill(&mut self.video_url, &other.video_url);
        fill(&mut self.discovered_at, &other.discovered_at);
        if self.genres.is_empty() {
            self.genres.clone_from(&other.genres);
        }
    }
}

fn default_season() -> u32 {
    1
}

/// Stable key of an episode within the checkpoint.
///
/// Season 1 keeps the `{show}_ep{n}` form already present in existing
/// checkpoints; every other season, specials (0) included, carries the
/// season number.
pub fn episode_key(show_id: &str, season: u32, number: u32) -> String {
    if season == 1 {
        format!("{show_id}_ep{number}")
    } else {
        format!("{show_id}_s{season}_ep{number}")
    }
}

/// One episode of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    /// Slug of the owning series.
    pub show_id: String,
    #[serde(default = "default_season")]
    pub season: u32,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_number: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub slug: Option<String>,
    pub url: String,
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<String>,
    /// Resolved media URL. Absent is a normal interim state.
    #[serde(
        default,
        deserialize_with = "lenient::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_url: Option<String>,
}

impl Episode {
    /// A numbered episode with its key derived from (show, season, number).
    pub fn numbered(show_id: &str, season: u32, number: u32, url: impl Into<String>) -> Self {
        Self {
            id: episode_key(show_id, season, number),
            show_id: show_id.to_string(),
            season,
            episode_number: Some(number),
            title: None,
            slug: None,
            url: url.into(),
            thumbnail: None,
            video_url: None,
        }
    }

    pub fn id_number(&self) -> i64 {
        deterministic_id(&self.id)
    }

    pub fn has_video(&self) -> bool {
        self.video_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}
