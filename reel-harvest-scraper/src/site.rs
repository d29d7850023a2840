//! Site strategy: everything that differs between catalog websites.
//!
//! Parsers are pure. They never fetch; the harvester decides which pages to
//! fetch and hands the bodies over. Missing markup yields `None` fields or
//! empty lists, never an error.

use reel_harvest_core::{CatalogItem, ItemKind};

/// One browsable section of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Path relative to the site base, e.g. `/iranianshows/`.
    pub path: String,
    pub kind: ItemKind,
}

impl Category {
    pub fn new(name: &str, path: &str, kind: ItemKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
        }
    }
}

/// Items found on one listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub items: Vec<CatalogItem>,
    pub has_next_page: bool,
}

/// Fields a detail page may add to its catalog item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub title: Option<String>,
    pub poster: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub total_episodes: Option<u32>,
    pub view_count: Option<u64>,
}

impl DetailFields {
    /// Overlay these fields onto `item`. Fields the page did not carry leave
    /// the item untouched.
    pub fn apply_to(&self, item: &mut CatalogItem) {
        if let Some(title) = &self.title {
            item.title.clone_from(title);
        }
        if self.poster.is_some() {
            item.poster.clone_from(&self.poster);
        }
        if self.description.is_some() {
            item.description.clone_from(&self.description);
        }
        if self.year.is_some() {
            item.year = self.year;
        }
        if !self.genres.is_empty() {
            item.genres.clone_from(&self.genres);
        }
        if self.total_episodes.is_some() {
            item.total_episodes = self.total_episodes;
        }
        if self.view_count.is_some() {
            item.view_count = self.view_count;
        }
    }
}

/// An episode link found on a series page.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeLink {
    pub season: u32,
    /// `None` when the page gives no parseable number.
    pub number: Option<u32>,
    pub url: String,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    pub fields: DetailFields,
    /// Video URL when the detail page embeds the player itself.
    pub video_url: Option<String>,
    pub episodes: Vec<EpisodeLink>,
}

/// Site-specific parsing and URL layout.
pub trait SiteParser: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    fn categories(&self) -> Vec<Category>;

    /// URL of listing page `page` (1-based) of `category`.
    fn listing_url(&self, category: &Category, page: u32) -> String;

    fn parse_listing(&self, html: &str, category: &Category, page: u32) -> ListingPage;

    fn parse_detail(&self, html: &str, item: &CatalogItem) -> DetailPage;

    /// Resolved video URL on a movie or episode page.
    fn parse_video(&self, html: &str, kind: ItemKind) -> Option<String>;
}
