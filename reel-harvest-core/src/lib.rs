//! Shared data model for reel-harvest.
//!
//! Catalog items, episodes, video URLs and genres, plus the deterministic
//! slug → integer ID mapping every exported table depends on.

pub mod genre;
pub mod ids;
pub mod item;
pub mod lenient;
pub mod util;
pub mod video;

pub use genre::{Genre, genre_slug, join_genres, split_genres};
pub use ids::{ID_MODULUS, deterministic_id};
pub use item::{CatalogItem, Episode, ItemKind, episode_key};
pub use util::{
    UrlError, clean_text, host_of, path_of, query_value, resolve_url, slug_from_url,
    title_from_slug,
};
pub use video::{ContentKind, VideoUrl, detect_cdn, detect_quality};
