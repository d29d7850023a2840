#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reel_harvest_core::{CatalogItem, ItemKind, resolve_url};
use reel_harvest_scraper::{FetchError, Fetcher};

pub const BASE: &str = "https://namakade.com";

type Hook = Box<dyn Fn(&str) + Send + Sync>;

/// In-memory fetcher: serves fixed pages by absolute URL, `None` otherwise.
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
    on_fetch: Option<Hook>,
    slow: Option<(String, Duration)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
            on_fetch: None,
            slow: None,
        }
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    /// Run `hook` with the absolute URL before each fetch returns.
    pub fn on_fetch(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_fetch = Some(Box::new(hook));
        self
    }

    /// Take `delay` to answer any URL containing `pattern`.
    pub fn slow(mut self, pattern: &str, delay: Duration) -> Self {
        self.slow = Some((pattern.to_string(), delay));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Fetcher for StaticFetcher {
    fn base_url(&self) -> &str {
        BASE
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        let absolute = resolve_url(BASE, url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        self.fetched.lock().unwrap().push(absolute.clone());
        if let Some(hook) = &self.on_fetch {
            hook(&absolute);
        }
        match &self.slow {
            Some((pattern, delay)) if absolute.contains(pattern.as_str()) => {
                tokio::time::sleep(*delay).await
            }
            _ => tokio::task::yield_now().await,
        }
        Ok(self.pages.get(&absolute).cloned())
    }
}

pub fn series(slug: &str) -> CatalogItem {
    let mut item = CatalogItem::new(
        slug,
        slug.to_uppercase(),
        format!("{BASE}/series/{slug}"),
        ItemKind::Series,
    );
    item.category = Some("Iranian Shows".into());
    item
}

pub fn movie(slug: &str) -> CatalogItem {
    CatalogItem::new(
        slug,
        slug.to_uppercase(),
        format!("{BASE}/iran-1-movies/drama/{slug}"),
        ItemKind::Movie,
    )
}

pub fn movie_page(video: &str, views: &str) -> String {
    format!(
        r#"<html><body>
<div id="divVidDet09">Views: {views}</div>
<video id="videoTag" class="video-js"><source src="{video}" type="video/mp4"></video>
</body></html>"#
    )
}

pub fn series_page(slug: &str, stated: u32, episodes: u32) -> String {
    let items: String = (1..=episodes)
        .map(|n| {
            format!(
                r#"<li><a href="/series/{slug}/episode/{n}" title="Episode {n}"><img src="/thumbs/{slug}-{n}.jpg"></a></li>"#
            )
        })
        .collect();
    format!(
        r#"<html><head><meta name="description" content="About {slug}"></head><body>
<div id="divVidDet08">Episodes: {stated}</div>
<ul id="gridMason2">{items}</ul>
</body></html>"#
    )
}

pub fn episode_page(video: &str) -> String {
    format!(
        r#"<html><body><script>
var seriesepisode_respose = {{"title": "x", "video_url": [{{"ios": "https://cdn.example/ios.m3u8"}}, {{"android": "{video}"}}]}};
</script></body></html>"#
    )
}
