mod common;

use common::*;
use reel_harvest_core::ItemKind;
use reel_harvest_scraper::{Category, DetailFields, FarsiplexSite, NamakadeSite, SiteParser};

const LISTING: &str = r#"<html><body>
<div class="grid">
  <div class="item">
    <a href="/series/shahrzad" title="Shahrzad">
      <img src="data:image/gif;base64,R0lGOD" data-src="/posters/shahrzad.jpg">
    </a>
  </div>
  <div class="item">
    <a href="https://namakade.com/series/gando"><img src="/posters/gando.jpg"></a>
    <h3> Gando </h3>
  </div>
  <div class="item">
    <a href="/series/mystery"><img src="/posters/mystery.jpg"></a>
  </div>
</div>
<div class="pagination">
  <a href="/iranianshows/?page=1">1</a>
  <a href="/iranianshows/?page=2">2</a>
</div>
</body></html>"#;

fn shows() -> Category {
    Category::new("Iranian Shows", "/iranianshows/", ItemKind::Series)
}

#[test]
fn listing_skips_untitled_cards() {
    let site = NamakadeSite::default();
    let page = site.parse_listing(LISTING, &shows(), 1);

    assert_eq!(page.items.len(), 2);
    assert!(page.has_next_page);

    let first = &page.items[0];
    assert_eq!(first.slug, "shahrzad");
    assert_eq!(first.title, "Shahrzad");
    assert_eq!(first.url, "https://namakade.com/series/shahrzad");
    assert_eq!(first.kind, ItemKind::Series);
    assert_eq!(first.category.as_deref(), Some("Iranian Shows"));
    assert_eq!(
        first.poster.as_deref(),
        Some("https://namakade.com/posters/shahrzad.jpg")
    );

    assert_eq!(page.items[1].slug, "gando");
    assert_eq!(page.items[1].title, "Gando");
}

#[test]
fn listing_without_link_to_next_page_is_last() {
    let site = NamakadeSite::default();
    let page = site.parse_listing(LISTING, &shows(), 2);
    assert!(!page.has_next_page);
}

#[test]
fn listing_urls_page_with_query() {
    let site = NamakadeSite::default();
    assert_eq!(
        site.listing_url(&shows(), 1),
        "https://namakade.com/iranianshows/"
    );
    assert_eq!(
        site.listing_url(&shows(), 3),
        "https://namakade.com/iranianshows/?page=3"
    );
}

#[test]
fn movie_listing_takes_genres_from_path() {
    let html = r#"<article class="post"><a href="/iran-1-movies/drama-romance/leila" title="Leila"></a></article>"#;
    let category = Category::new("Iranian Movies", "/iran-1-movies/", ItemKind::Movie);
    let page = NamakadeSite::default().parse_listing(html, &category, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].genres, vec!["Drama", "Romance"]);
    assert!(!page.has_next_page);
}

#[test]
fn series_detail_lists_episodes_in_order() {
    let site = NamakadeSite::default();
    let detail = site.parse_detail(&series_page("shahrzad", 28, 3), &series("shahrzad"));

    assert_eq!(detail.fields.total_episodes, Some(28));
    assert_eq!(detail.fields.description.as_deref(), Some("About shahrzad"));
    assert_eq!(detail.video_url, None);

    let numbers: Vec<_> = detail.episodes.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
    let ep = &detail.episodes[1];
    assert_eq!(ep.url, "https://namakade.com/series/shahrzad/episode/2");
    assert_eq!(ep.title.as_deref(), Some("Episode 2"));
    assert_eq!(
        ep.thumbnail.as_deref(),
        Some("https://namakade.com/thumbs/shahrzad-2.jpg")
    );
}

#[test]
fn movie_detail_reads_views_and_player() {
    let site = NamakadeSite::default();
    let html = movie_page("https://media.iranproud2.net/leila.mp4", "12,345");
    let detail = site.parse_detail(&html, &movie("leila"));

    assert_eq!(detail.fields.view_count, Some(12_345));
    assert_eq!(
        detail.video_url.as_deref(),
        Some("https://media.negahestan.com/leila.mp4")
    );
    assert!(detail.episodes.is_empty());
}

#[test]
fn episode_video_prefers_android_stream() {
    let site = NamakadeSite::default();
    let html = episode_page("https://media.iranproud.net/shahrzad/1.mp4");
    assert_eq!(
        site.parse_video(&html, ItemKind::Series).as_deref(),
        Some("https://media.negahestan.com/shahrzad/1.mp4")
    );
    assert_eq!(site.parse_video("<html></html>", ItemKind::Series), None);
}

#[test]
fn missing_markup_yields_empty_fields() {
    let site = NamakadeSite::default();
    let detail = site.parse_detail("<html><body>nothing here</body></html>", &series("x"));
    assert_eq!(detail.fields, DetailFields::default());
    assert!(detail.episodes.is_empty());
}

const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://farsiplex.com/tvshow/the-office/</loc><lastmod>2024-03-01T10:00:00+00:00</lastmod></url>
  <url><loc>https://farsiplex.com/tvshow/shahrzad/</loc></url>
  <url><loc>https://farsiplex.com/tvshow/the-office/</loc></url>
</urlset>"#;

#[test]
fn sitemap_listing_titles_from_slug() {
    let site = FarsiplexSite::default();
    let category = Category::new("TV Shows", "tvshows", ItemKind::Series);
    assert_eq!(
        site.listing_url(&category, 2),
        "https://farsiplex.com/wp-sitemap-posts-tvshows-2.xml"
    );

    let page = site.parse_listing(SITEMAP, &category, 1);
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_next_page);
    assert_eq!(page.items[0].slug, "the-office");
    assert_eq!(page.items[0].title, "The Office");
    assert_eq!(page.items[1].title, "Shahrzad");
}

const DOOPLAY_SHOW: &str = r#"<html><body>
<div class="sheader">
  <div class="poster"><img src="https://farsiplex.com/wp-content/uploads/office.jpg"></div>
  <div class="data">
    <h1>The Office</h1>
    <div class="extra"><span class="date">Mar. 24, 2005</span></div>
    <div class="sgeneros">
      <a href="https://farsiplex.com/genres/comedy/">Comedy</a>
      <a href="https://farsiplex.com/genres/comedy/">Comedy</a>
      <a href="/genres/drama/">Drama</a>
    </div>
  </div>
</div>
<div id="seasons">
  <div class="se-c">
    <div class="se-q"><span class="se-t">1</span></div>
    <div class="se-a"><ul class="episodios">
      <li><div class="numerando">1 - 1</div><div class="episodiotitle"><a href="https://farsiplex.com/episode/the-office-1x1/">Pilot</a></div></li>
      <li><div class="numerando">1 - 2</div><div class="episodiotitle"><a href="https://farsiplex.com/episode/the-office-1x2/">Diversity Day</a></div></li>
    </ul></div>
  </div>
  <div class="se-c">
    <div class="se-q"><span class="se-t">Season 2</span></div>
    <div class="se-a"><ul class="episodios">
      <li><div class="numerando">2 - X</div><div class="episodiotitle"><a href="https://farsiplex.com/episode/the-office-special/">Special</a></div></li>
    </ul></div>
  </div>
</div>
</body></html>"#;

#[test]
fn dooplay_detail_reads_seasons() {
    let site = FarsiplexSite::default();
    let mut item = series("the-office");
    item.url = "https://farsiplex.com/tvshow/the-office/".into();
    let detail = site.parse_detail(DOOPLAY_SHOW, &item);

    assert_eq!(detail.fields.title.as_deref(), Some("The Office"));
    assert_eq!(detail.fields.year, Some(2005));
    assert_eq!(detail.fields.genres, vec!["Comedy", "Drama"]);
    assert_eq!(
        detail.fields.poster.as_deref(),
        Some("https://farsiplex.com/wp-content/uploads/office.jpg")
    );

    let eps: Vec<_> = detail
        .episodes
        .iter()
        .map(|e| (e.season, e.number, e.title.as_deref()))
        .collect();
    assert_eq!(
        eps,
        vec![
            (1, Some(1), Some("Pilot")),
            (1, Some(2), Some("Diversity Day")),
            (2, None, Some("Special")),
        ]
    );
    assert_eq!(detail.episodes[2].slug.as_deref(), Some("the-office-special"));
}

#[test]
fn dooplay_video_prefers_mp4_source_param() {
    let site = FarsiplexSite::default();
    let html = r#"<html><body>
<iframe src="https://farsiplex.com/play/?source=https%3A%2F%2Fcdn.farsicdn.buzz%2Fx%2F720.m3u8&id=1"></iframe>
<a href="/download/?id=1&source=https%3A%2F%2Fcdn.farsicdn.buzz%2Fx%2F1080.mp4">Download</a>
</body></html>"#;
    assert_eq!(
        site.parse_video(html, ItemKind::Movie).as_deref(),
        Some("https://cdn.farsicdn.buzz/x/1080.mp4")
    );

    let direct = r#"<video><source src="https://cdn.farsicdn.buzz/y/480.mp4"></video>"#;
    assert_eq!(
        site.parse_video(direct, ItemKind::Movie).as_deref(),
        Some("https://cdn.farsicdn.buzz/y/480.mp4")
    );
    assert_eq!(site.parse_video("<p>none</p>", ItemKind::Movie), None);
}

#[test]
fn dooplay_sources_carry_quality_and_cdn() {
    let site = FarsiplexSite::default();
    let html = r#"<html><body>
<iframe src="https://farsiplex.com/play/?source=https%3A%2F%2Fs1.farsicdn.buzz%2Fx%2F720.m3u8"></iframe>
<a href="/dl/?source=https%3A%2F%2Fcdn2.farsiland.com%2Fx%2Fmovie.mp4">Download</a>
<a href="/dl/?source=https%3A%2F%2Fcdn2.farsiland.com%2Fx%2Fmovie.mp4">Mirror</a>
<a href="/about/">About</a>
</body></html>"#;
    let sources = site.media_sources(html);
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].quality, "720p");
    assert_eq!(sources[0].cdn.as_deref(), Some("farsicdn"));
    assert!(sources[0].linked);
    assert_eq!(sources[1].quality, "HD");
    assert_eq!(sources[1].cdn.as_deref(), Some("farsiland"));
    assert_eq!(
        site.parse_video(html, ItemKind::Movie).as_deref(),
        Some("https://cdn2.farsiland.com/x/movie.mp4")
    );
}
