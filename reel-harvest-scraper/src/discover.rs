//! Catalog discovery: walk every category's listing pages and seed the
//! checkpoint with items it does not know yet.

use reel_harvest_checkpoint::{Accumulator, Phase, now_timestamp};

use crate::context::HarvestContext;
use crate::error::HarvestError;
use crate::events::HarvestEvent;
use crate::fetcher::Fetcher;
use crate::site::SiteParser;

pub const DEFAULT_MAX_PAGES: u32 = 50;

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub max_pages: u32,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    pub pages_fetched: usize,
    pub new_items: usize,
    /// New items per category, in walk order.
    pub by_category: Vec<(String, usize)>,
    pub interrupted: bool,
}

/// Walk the site's categories and add unseen items to `accumulator`.
///
/// A category ends at `max_pages`, at a page that cannot be fetched, at a
/// page that adds nothing new, or when the page has no link onward. Only
/// URLs the accumulator does not already know are added; existing records
/// are never overwritten here.
pub async fn discover_catalog<F: Fetcher, P: SiteParser>(
    fetcher: &F,
    site: &P,
    accumulator: &mut Accumulator,
    options: &DiscoverOptions,
    ctx: &HarvestContext,
) -> Result<DiscoverySummary, HarvestError> {
    let mut summary = DiscoverySummary::default();

    'categories: for category in site.categories() {
        ctx.emit(HarvestEvent::CategoryStarted {
            name: category.name.clone(),
        });
        log::info!("Discovering {}", category.name);
        let mut category_new = 0;

        for page in 1..=options.max_pages.max(1) {
            if ctx.is_stopped() {
                summary.interrupted = true;
                summary.by_category.push((category.name.clone(), category_new));
                break 'categories;
            }

            let url = site.listing_url(&category, page);
            let Some(html) = fetcher.fetch(&url).await? else {
                log::debug!("{}: page {page} unavailable, moving on", category.name);
                break;
            };
            summary.pages_fetched += 1;

            let listing = site.parse_listing(&html, &category, page);
            let found = listing.items.len();
            let mut page_new = 0;
            for mut item in listing.items {
                if accumulator.knows_show_url(&item.url) || accumulator.show(&item.slug).is_some() {
                    continue;
                }
                item.discovered_at = Some(now_timestamp());
                accumulator.upsert_item(item);
                page_new += 1;
            }
            category_new += page_new;

            ctx.emit(HarvestEvent::PageScanned {
                category: category.name.clone(),
                page,
                found,
                new_items: page_new,
            });

            if page_new == 0 || !listing.has_next_page {
                break;
            }
        }

        log::info!("{}: {category_new} new items", category.name);
        ctx.emit(HarvestEvent::CategoryDone {
            name: category.name.clone(),
            new_items: category_new,
        });
        summary.new_items += category_new;
        summary.by_category.push((category.name, category_new));
    }

    if !summary.interrupted {
        accumulator.mark_discovery_run();
        accumulator.set_phase(Phase::DetailScraping);
    }
    Ok(summary)
}
