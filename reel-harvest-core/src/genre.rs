use serde::{Deserialize, Serialize};

use crate::ids::deterministic_id;

/// A genre row as the app stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Genre {
    /// Build a genre whose ID is derived from the lower-cased name.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: deterministic_id(&name.to_lowercase()),
            name: name.to_string(),
            slug: genre_slug(name),
        }
    }
}

/// `"Action & Adventure"` → `"action-and-adventure"`.
pub fn genre_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace('&', "and")
}

/// Join genre names into the denormalized column value the app expects.
///
/// Returns `None` for an empty list so the column stays `NULL`.
pub fn join_genres(genres: &[String]) -> Option<String> {
    let names: Vec<&str> = genres
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Split a denormalized genre column back into names.
pub fn split_genres(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
