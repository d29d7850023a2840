//! Built-in site strategies.

pub mod farsiplex;
pub(crate) mod html;
pub mod namakade;

use reel_harvest_core::{CatalogItem, ItemKind};

use crate::error::HarvestError;
use crate::site::{Category, DetailPage, ListingPage, SiteParser};

pub use farsiplex::{FarsiplexSite, MediaSource};
pub use namakade::NamakadeSite;

/// Names accepted by [`Site::by_name`].
pub const SITE_NAMES: [&str; 2] = ["namakade", "farsiplex"];

/// Any built-in site, chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Site {
    Namakade(NamakadeSite),
    Farsiplex(FarsiplexSite),
}

impl Site {
    pub fn by_name(name: &str) -> Result<Self, HarvestError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "namakade" => Ok(Site::Namakade(NamakadeSite::default())),
            "farsiplex" => Ok(Site::Farsiplex(FarsiplexSite::default())),
            other => Err(HarvestError::UnknownSite(other.to_string())),
        }
    }

    fn inner(&self) -> &dyn SiteParser {
        match self {
            Site::Namakade(s) => s,
            Site::Farsiplex(s) => s,
        }
    }
}

impl SiteParser for Site {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn base_url(&self) -> &str {
        self.inner().base_url()
    }

    fn categories(&self) -> Vec<Category> {
        self.inner().categories()
    }

    fn listing_url(&self, category: &Category, page: u32) -> String {
        self.inner().listing_url(category, page)
    }

    fn parse_listing(&self, html: &str, category: &Category, page: u32) -> ListingPage {
        self.inner().parse_listing(html, category, page)
    }

    fn parse_detail(&self, html: &str, item: &CatalogItem) -> DetailPage {
        self.inner().parse_detail(html, item)
    }

    fn parse_video(&self, html: &str, kind: ItemKind) -> Option<String> {
        self.inner().parse_video(html, kind)
    }
}
