//! Small helpers over `scraper` shared by the site parsers.

use std::str::FromStr;

use scraper::{ElementRef, Selector};

use reel_harvest_core::{clean_text, query_value};

/// All descendants of `root` matching `css`. An invalid selector matches
/// nothing.
pub(crate) fn select<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => root.select(&sel).collect(),
        Err(e) => {
            log::debug!("invalid selector {css:?}: {e:?}");
            Vec::new()
        }
    }
}

pub(crate) fn first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    select(root, css).into_iter().next()
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Trimmed, non-empty attribute value.
pub(crate) fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Image URL of an `img`, preferring lazy-load attributes over placeholders.
pub(crate) fn image_src(img: ElementRef<'_>) -> Option<String> {
    attr(img, "data-src")
        .or_else(|| attr(img, "data-lazy-src"))
        .or_else(|| attr(img, "src"))
        .filter(|s| !s.starts_with("data:"))
}

/// First run of digits in `s`, ignoring thousands separators.
pub(crate) fn first_number<T: FromStr>(s: &str) -> Option<T> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Whether `href` carries the query parameter `page=<page>`.
pub(crate) fn links_to_page(href: &str, page: u32) -> bool {
    query_value(href, "page").and_then(|v| v.parse::<u32>().ok()) == Some(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(first_number::<u64>("Views: 12,345"), Some(12_345));
        assert_eq!(first_number::<u32>("1 - 3"), Some(1));
        assert_eq!(first_number::<u32>("no digits"), None);
    }

    #[test]
    fn page_links() {
        assert!(links_to_page("/iranianshows/?page=3", 3));
        assert!(links_to_page("https://x/list?sort=new&page=2", 2));
        assert!(!links_to_page("/iranianshows/?page=30", 3));
        assert!(!links_to_page("/iranianshows/?subpage=3", 3));
        assert!(!links_to_page("/iranianshows/", 2));
    }
}
