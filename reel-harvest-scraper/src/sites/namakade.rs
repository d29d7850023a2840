//! namakade.com: paged HTML listings, episode grids, and player data
//! embedded either as a `<video>` element (movies) or as a JSON script
//! assignment (series episodes).

use std::collections::HashSet;

use scraper::Html;

use reel_harvest_core::{CatalogItem, ItemKind, resolve_url, slug_from_url};

use crate::site::{Category, DetailFields, DetailPage, EpisodeLink, ListingPage, SiteParser};
use crate::sites::html::{attr, first, first_number, image_src, links_to_page, select, text};

pub const NAMAKADE_BASE_URL: &str = "https://namakade.com";

const CARD_SELECTOR: &str = "article.item, div.item, li.item, div.video-item, article.post";
const FALLBACK_CARD_SELECTOR: &str = ".poster, .movie-item, .series-item";
const DETAIL_INFO_SELECTOR: &str = "div[id^='divVidDet']";
const PLAYER_SCRIPT_VAR: &str = "seriesepisode_respose";

/// Legacy media hosts that now serve from the negahestan CDN.
const HOST_REWRITES: [(&str, &str); 2] = [
    ("media.iranproud2.net", "media.negahestan.com"),
    ("media.iranproud.net", "media.negahestan.com"),
];

#[derive(Debug, Clone)]
pub struct NamakadeSite {
    base_url: String,
}

impl Default for NamakadeSite {
    fn default() -> Self {
        Self::new(NAMAKADE_BASE_URL)
    }
}

impl NamakadeSite {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, href: &str) -> Option<String> {
        resolve_url(&self.base_url, href).ok()
    }

    fn episode_links(&self, doc: &Html) -> Vec<EpisodeLink> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for li in select(doc.root_element(), "ul#gridMason2 li") {
            let Some(anchor) = first(li, "a[href]") else {
                continue;
            };
            let Some(url) = attr(anchor, "href").and_then(|h| self.absolute(&h)) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }
            let title = attr(anchor, "title").or_else(|| {
                let t = text(li);
                (!t.is_empty()).then_some(t)
            });
            links.push(EpisodeLink {
                season: 1,
                number: Some(links.len() as u32 + 1),
                slug: slug_from_url(&url),
                title,
                thumbnail: first(li, "img").and_then(image_src).and_then(|s| self.absolute(&s)),
                url,
            });
        }
        links
    }
}

/// Replace retired media hosts with their current equivalent.
pub fn rewrite_media_host(url: &str) -> String {
    HOST_REWRITES
        .iter()
        .fold(url.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// `/iran-1-movies/action-comedy/slug` → `["Action", "Comedy"]`.
pub fn genres_from_movie_path(url: &str) -> Vec<String> {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => url,
    };
    let parts: Vec<&str> = path
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .split('/')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 || parts[0] != "iran-1-movies" {
        return Vec::new();
    }
    parts[1]
        .split('-')
        .filter(|g| !g.is_empty())
        .map(|g| {
            let mut chars = g.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Pull the object literal assigned to `var <name> =` out of page source.
fn script_object<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let at = source.find(name)?;
    let after_name = &source[at + name.len()..];
    let eq = after_name.find('=')?;
    if !after_name[..eq].trim().is_empty() {
        return None;
    }
    let body = &after_name[eq + 1..];
    let open = body.find('{')?;
    if !body[..open].trim().is_empty() {
        return None;
    }
    let body = &body[open..];

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Choose the stream from the player JSON: Android first, then iOS.
fn player_video_url(json: &str) -> Option<String> {
    let data: serde_json::Value = serde_json::from_str(json).ok()?;
    let variants = data.get("video_url")?.as_array()?;
    ["android", "ios"].iter().find_map(|platform| {
        variants
            .iter()
            .filter_map(|v| v.get(platform).and_then(|u| u.as_str()))
            .map(str::trim)
            .find(|u| !u.is_empty())
            .map(rewrite_media_host)
    })
}

impl SiteParser for NamakadeSite {
    fn name(&self) -> &str {
        "namakade"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn categories(&self) -> Vec<Category> {
        vec![
            Category::new("Iranian Shows", "/iranianshows/", ItemKind::Series),
            Category::new("Turkish Series", "/turkseries/", ItemKind::Series),
            Category::new("Korean Series", "/koreanseries/", ItemKind::Series),
            Category::new("Iranian Movies", "/iran-1-movies/", ItemKind::Movie),
            Category::new("Foreign Movies", "/foreign-movies/", ItemKind::Movie),
            Category::new("Series", "/series/", ItemKind::Series),
            Category::new("Anime", "/anime/", ItemKind::Series),
        ]
    }

    fn listing_url(&self, category: &Category, page: u32) -> String {
        let path = format!("/{}/", category.path.trim_matches('/'));
        if page <= 1 {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?page={}", self.base_url, path, page)
        }
    }

    fn parse_listing(&self, html: &str, category: &Category, page: u32) -> ListingPage {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let mut cards = select(root, CARD_SELECTOR);
        if cards.is_empty() {
            cards = select(root, FALLBACK_CARD_SELECTOR);
        }

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for card in cards {
            let anchor = if card.value().name() == "a" {
                Some(card)
            } else {
                first(card, "a[href]")
            };
            let Some(anchor) = anchor else { continue };
            let Some(url) = attr(anchor, "href").and_then(|h| self.absolute(&h)) else {
                continue;
            };
            let title = attr(anchor, "title").or_else(|| {
                first(card, "h2, h3, .title")
                    .map(text)
                    .filter(|t| !t.is_empty())
            });
            // Cards without any title are navigation or ads, not catalog entries.
            let Some(title) = title else {
                log::debug!("Skipping untitled card {url}");
                continue;
            };
            let Some(slug) = slug_from_url(&url) else { continue };
            if !seen.insert(url.clone()) {
                continue;
            }

            let mut item = CatalogItem::new(slug, title, url, category.kind);
            item.category = Some(category.name.clone());
            item.poster = first(card, "img").and_then(image_src).and_then(|s| self.absolute(&s));
            if category.kind == ItemKind::Movie {
                item.genres = genres_from_movie_path(&item.url);
            }
            items.push(item);
        }

        let has_next_page = select(root, "a[href]")
            .into_iter()
            .filter_map(|a| a.value().attr("href"))
            .any(|href| links_to_page(href, page + 1));

        ListingPage {
            items,
            has_next_page,
        }
    }

    fn parse_detail(&self, html: &str, item: &CatalogItem) -> DetailPage {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let mut fields = DetailFields::default();
        for info in select(root, DETAIL_INFO_SELECTOR) {
            let line = text(info);
            let value = line.rsplit(':').next().unwrap_or("");
            if line.contains("Views") && fields.view_count.is_none() {
                fields.view_count = first_number(value);
            } else if line.contains("Episodes") && fields.total_episodes.is_none() {
                fields.total_episodes = first_number(value);
            } else if line.contains("Year") && fields.year.is_none() {
                fields.year = first_number(value);
            }
        }
        fields.description = first(root, "meta[name='description']")
            .and_then(|m| attr(m, "content"))
            .or_else(|| first(root, ".description, .summary").map(text).filter(|t| !t.is_empty()));

        match item.kind {
            ItemKind::Movie => DetailPage {
                fields,
                video_url: self.parse_video(html, ItemKind::Movie),
                episodes: Vec::new(),
            },
            ItemKind::Series => DetailPage {
                fields,
                video_url: None,
                episodes: self.episode_links(&doc),
            },
        }
    }

    fn parse_video(&self, html: &str, kind: ItemKind) -> Option<String> {
        if kind == ItemKind::Movie {
            let doc = Html::parse_document(html);
            let root = doc.root_element();
            let player = first(root, "video#videoTag")
                .or_else(|| first(root, "video.video-js"))
                .or_else(|| first(root, "video"));
            let src = player
                .and_then(|v| first(v, "source[src]"))
                .and_then(|s| attr(s, "src"));
            if let Some(src) = src {
                return Some(rewrite_media_host(&src));
            }
        }
        script_object(html, PLAYER_SCRIPT_VAR).and_then(player_video_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_rewrite() {
        assert_eq!(
            rewrite_media_host("https://media.iranproud2.net/a/b.mp4"),
            "https://media.negahestan.com/a/b.mp4"
        );
        assert_eq!(
            rewrite_media_host("https://media.iranproud.net/a/b.mp4"),
            "https://media.negahestan.com/a/b.mp4"
        );
    }

    #[test]
    fn movie_path_genres() {
        assert_eq!(
            genres_from_movie_path("https://namakade.com/iran-1-movies/action-COMEDY-foreign/leila"),
            vec!["Action", "Comedy", "Foreign"]
        );
        assert!(genres_from_movie_path("/series/shahrzad").is_empty());
        assert!(genres_from_movie_path("/iran-1-movies/leila").is_empty());
    }

    #[test]
    fn script_object_handles_nested_braces_and_strings() {
        let src = r#"<script>var seriesepisode_respose = {"a": {"b": "}"}, "video_url": []}; foo();</script>"#;
        assert_eq!(
            script_object(src, PLAYER_SCRIPT_VAR),
            Some(r#"{"a": {"b": "}"}, "video_url": []}"#)
        );
        assert_eq!(script_object("var other = 1;", PLAYER_SCRIPT_VAR), None);
    }

    #[test]
    fn player_prefers_android() {
        let json = r#"{"video_url": [{"ios": "https://media.iranproud.net/i.m3u8"}, {"android": "https://media.iranproud2.net/a.mp4"}]}"#;
        assert_eq!(
            player_video_url(json).as_deref(),
            Some("https://media.negahestan.com/a.mp4")
        );
        let ios_only = r#"{"video_url": [{"ios": "https://cdn/i.m3u8"}]}"#;
        assert_eq!(player_video_url(ios_only).as_deref(), Some("https://cdn/i.m3u8"));
        assert_eq!(player_video_url(r#"{"video_url": []}"#), None);
        assert_eq!(player_video_url("not json"), None);
    }
}
