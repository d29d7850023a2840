//! farsiplex.com, a DooPlay WordPress site.
//!
//! Listings come from the XML sitemaps WordPress publishes, which are far
//! cheaper than the themed archive pages and list every post. Detail pages
//! follow DooPlay's markup.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::Html;

use reel_harvest_core::{
    CatalogItem, ItemKind, detect_cdn, detect_quality, path_of, query_value, resolve_url,
    slug_from_url, title_from_slug,
};

use crate::site::{Category, DetailFields, DetailPage, EpisodeLink, ListingPage, SiteParser};
use crate::sites::html::{attr, first, first_number, image_src, select, text};

pub const FARSIPLEX_BASE_URL: &str = "https://farsiplex.com";

/// WordPress caps each sitemap page at this many URLs.
pub const SITEMAP_PAGE_SIZE: usize = 2000;

/// A playable file offered by a player page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub url: String,
    pub quality: &'static str,
    pub cdn: Option<String>,
    /// Carried in a `source=` parameter rather than a `<source>` element.
    pub linked: bool,
}

impl MediaSource {
    fn new(url: String, linked: bool) -> Self {
        Self {
            quality: detect_quality(&url),
            cdn: detect_cdn(&url),
            url,
            linked,
        }
    }
}

/// One `<url>` entry of a WordPress sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// Read `url/loc` and `url/lastmod` out of a sitemap document. Malformed XML
/// ends parsing and keeps what was read so far.
pub fn parse_sitemap(xml: &str) -> Vec<SitemapEntry> {
    #[derive(Clone, Copy, PartialEq)]
    enum Field {
        None,
        Loc,
        Lastmod,
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_url = false;
    let mut field = Field::None;
    let mut loc = String::new();
    let mut lastmod = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = true;
                    loc.clear();
                    lastmod.clear();
                }
                b"loc" if in_url => field = Field::Loc,
                b"lastmod" if in_url => field = Field::Lastmod,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let value = match t.unescape() {
                    Ok(v) => v.into_owned(),
                    Err(_) => continue,
                };
                match field {
                    Field::Loc => loc.push_str(value.trim()),
                    Field::Lastmod => lastmod.push_str(value.trim()),
                    Field::None => {}
                }
            }
            Ok(Event::CData(c)) => {
                let value = String::from_utf8_lossy(&c).into_owned();
                match field {
                    Field::Loc => loc.push_str(value.trim()),
                    Field::Lastmod => lastmod.push_str(value.trim()),
                    Field::None => {}
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = false;
                    if !loc.is_empty() {
                        entries.push(SitemapEntry {
                            loc: std::mem::take(&mut loc),
                            lastmod: (!lastmod.is_empty()).then(|| std::mem::take(&mut lastmod)),
                        });
                    }
                }
                b"loc" | b"lastmod" => field = Field::None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "sitemap parse error at byte {}: {e}",
                    reader.error_position()
                );
                break;
            }
        }
    }
    entries
}

/// A four-digit year (1900-2099) anywhere in `s`.
fn year_in(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    (0..bytes.len().saturating_sub(3)).find_map(|i| {
        let window = &bytes[i..i + 4];
        let bounded = (i == 0 || !bytes[i - 1].is_ascii_digit())
            && bytes.get(i + 4).is_none_or(|b| !b.is_ascii_digit());
        if bounded && window.iter().all(u8::is_ascii_digit) && matches!(&window[..2], b"19" | b"20")
        {
            std::str::from_utf8(window).ok()?.parse().ok()
        } else {
            None
        }
    })
}

/// `"1 - 3"` → `3`. The part after the last dash is the episode.
fn episode_number(numerando: &str) -> Option<u32> {
    numerando.rsplit('-').next()?.trim().parse().ok()
}

fn has_extension(url: &str, ext: &str) -> bool {
    path_of(url).is_some_and(|p| p.to_ascii_lowercase().ends_with(ext))
}

fn is_media(url: &str) -> bool {
    has_extension(url, ".mp4") || has_extension(url, ".m3u8")
}

#[derive(Debug, Clone)]
pub struct FarsiplexSite {
    base_url: String,
}

impl Default for FarsiplexSite {
    fn default() -> Self {
        Self::new(FARSIPLEX_BASE_URL)
    }
}

impl FarsiplexSite {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, href: &str) -> Option<String> {
        resolve_url(&self.base_url, href).ok()
    }

    /// Every media file on a player page, `<source>` elements first, each
    /// URL once.
    pub fn media_sources(&self, html: &str) -> Vec<MediaSource> {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let direct = select(root, "source[src]")
            .into_iter()
            .filter_map(|s| attr(s, "src"))
            .filter_map(|src| self.absolute(&src))
            .map(|url| (url, false));
        let linked = select(root, "iframe[src]")
            .into_iter()
            .filter_map(|f| attr(f, "src"))
            .chain(select(root, "a[href]").into_iter().filter_map(|a| attr(a, "href")))
            .filter_map(|link| query_value(&link, "source"))
            .map(|url| (url, true));

        let mut seen = HashSet::new();
        direct
            .chain(linked)
            .filter(|(url, _)| is_media(url) && seen.insert(url.clone()))
            .map(|(url, linked)| MediaSource::new(url, linked))
            .collect()
    }

    fn episode_link(&self, li: scraper::ElementRef<'_>, season: u32) -> Option<EpisodeLink> {
        let anchor = first(li, "a[href*='/episode/']")?;
        let url = attr(anchor, "href").and_then(|h| self.absolute(&h))?;
        let numerando = first(li, "div.numerando").map(text).unwrap_or_default();
        let title = first(li, "div.episodiotitle a, .episodiotitle")
            .map(text)
            .filter(|t| !t.is_empty());
        Some(EpisodeLink {
            season,
            number: episode_number(&numerando),
            slug: slug_from_url(&url),
            title,
            thumbnail: first(li, "img").and_then(image_src).and_then(|s| self.absolute(&s)),
            url,
        })
    }
}

impl SiteParser for FarsiplexSite {
    fn name(&self) -> &str {
        "farsiplex"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn categories(&self) -> Vec<Category> {
        vec![
            Category::new("Movies", "movies", ItemKind::Movie),
            Category::new("TV Shows", "tvshows", ItemKind::Series),
        ]
    }

    fn listing_url(&self, category: &Category, page: u32) -> String {
        format!(
            "{}/wp-sitemap-posts-{}-{}.xml",
            self.base_url,
            category.path.trim_matches('/'),
            page.max(1)
        )
    }

    fn parse_listing(&self, html: &str, category: &Category, _page: u32) -> ListingPage {
        let entries = parse_sitemap(html);
        let has_next_page = entries.len() >= SITEMAP_PAGE_SIZE;

        let mut seen = HashSet::new();
        let items = entries
            .into_iter()
            .filter(|e| seen.insert(e.loc.clone()))
            .filter_map(|e| {
                let slug = slug_from_url(&e.loc)?;
                // Sitemaps carry no titles; the detail page replaces this one.
                let title = title_from_slug(&slug);
                let mut item = CatalogItem::new(slug, title, e.loc, category.kind);
                item.category = Some(category.name.clone());
                Some(item)
            })
            .collect();

        ListingPage {
            items,
            has_next_page,
        }
    }

    fn parse_detail(&self, html: &str, item: &CatalogItem) -> DetailPage {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let mut genres: Vec<String> = Vec::new();
        for a in select(root, "a[href*='/genres/']") {
            let g = text(a);
            if !g.is_empty() && !genres.contains(&g) {
                genres.push(g);
            }
        }

        let fields = DetailFields {
            title: first(root, "h1").map(text).filter(|t| !t.is_empty()),
            poster: first(root, "div.poster img")
                .and_then(image_src)
                .and_then(|s| self.absolute(&s)),
            description: first(root, "div.wp-content p, div[itemprop='description']")
                .map(text)
                .filter(|t| !t.is_empty()),
            year: first(root, "span.date").and_then(|d| year_in(&text(d))),
            genres,
            total_episodes: None,
            view_count: None,
        };

        let mut episodes = Vec::new();
        let mut seen = HashSet::new();
        if item.kind == ItemKind::Series {
            let seasons = select(root, "div.se-c");
            if seasons.is_empty() {
                for li in select(root, "ul.episodios li") {
                    if let Some(link) = self.episode_link(li, 1) {
                        if seen.insert(link.url.clone()) {
                            episodes.push(link);
                        }
                    }
                }
            } else {
                for season_block in seasons {
                    let season = first(season_block, "span.se-t")
                        .and_then(|s| first_number(&text(s)))
                        .unwrap_or(1);
                    for li in select(season_block, "ul.episodios li") {
                        if let Some(link) = self.episode_link(li, season) {
                            if seen.insert(link.url.clone()) {
                                episodes.push(link);
                            }
                        }
                    }
                }
            }
        }

        DetailPage {
            fields,
            video_url: match item.kind {
                ItemKind::Movie => self.parse_video(html, ItemKind::Movie),
                ItemKind::Series => None,
            },
            episodes,
        }
    }

    fn parse_video(&self, html: &str, _kind: ItemKind) -> Option<String> {
        let sources = self.media_sources(html);
        let chosen = sources
            .iter()
            .find(|s| !s.linked)
            .or_else(|| sources.iter().find(|s| has_extension(&s.url, ".mp4")))
            .or_else(|| sources.first())?;
        log::debug!(
            "picked {} ({}, {}) of {} sources",
            chosen.url,
            chosen.quality,
            chosen.cdn.as_deref().unwrap_or("unknown host"),
            sources.len()
        );
        Some(chosen.url.clone())
    }
}
