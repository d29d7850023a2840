//! Catalog harvesting: rate-limited fetching, site strategies, discovery,
//! and the checkpointed parallel harvest executor.

pub mod context;
pub mod discover;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod harvest;
pub mod report;
pub mod site;
pub mod sites;

pub use context::HarvestContext;
pub use discover::{DEFAULT_MAX_PAGES, DiscoverOptions, DiscoverySummary, discover_catalog};
pub use error::{FetchError, HarvestError};
pub use events::HarvestEvent;
pub use fetcher::{FetchDiscipline, Fetcher, FetcherConfig, HttpFetcher};
pub use harvest::{
    HarvestOptions, HarvestTask, Harvester, MAX_WORKERS, PlanOptions, TaskYield, plan_tasks,
    run_harvest,
};
pub use report::{HarvestReport, HarvestSummary, TaskOutcome, TaskState};
pub use site::{Category, DetailFields, DetailPage, EpisodeLink, ListingPage, SiteParser};
pub use sites::{FarsiplexSite, MediaSource, NamakadeSite, SITE_NAMES, Site};
