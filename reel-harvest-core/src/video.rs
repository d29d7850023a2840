use serde::{Deserialize, Serialize};

use crate::util::host_of;

/// Which table a video URL's `content_id` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Episode,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Episode => "episode",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(ContentKind::Movie),
            "episode" => Some(ContentKind::Episode),
            _ => None,
        }
    }
}

/// One playable variant of a movie or episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoUrl {
    pub content_id: i64,
    pub content_kind: ContentKind,
    pub quality: String,
    pub url: String,
    pub file_size_mb: Option<f64>,
}

impl VideoUrl {
    /// A variant whose quality is read from the URL, or `"auto"` when the URL
    /// says nothing about it.
    pub fn detected(content_id: i64, content_kind: ContentKind, url: &str) -> Self {
        Self {
            content_id,
            content_kind,
            quality: quality_hint(url).unwrap_or("auto").to_string(),
            url: url.to_string(),
            file_size_mb: None,
        }
    }
}

fn quality_hint(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    if lower.contains("1080") || lower.contains("fhd") {
        Some("1080p")
    } else if lower.contains("720") || lower.contains("hd") {
        Some("720p")
    } else if lower.contains("480") {
        Some("480p")
    } else if lower.contains("360") {
        Some("360p")
    } else {
        None
    }
}

/// Quality label of a player source.
///
/// `1080`/`fhd` → `1080p`, `720`/`hd` → `720p`, `480` → `480p`,
/// `360` → `360p`, anything else `HD`.
pub fn detect_quality(url: &str) -> &'static str {
    quality_hint(url).unwrap_or("HD")
}

/// CDN label for a media URL: `farsiland`, `farsicdn`, or the bare host.
pub fn detect_cdn(url: &str) -> Option<String> {
    let host = host_of(url)?;
    if host.contains("farsiland") {
        Some("farsiland".to_string())
    } else if host.contains("farsicdn") {
        Some("farsicdn".to_string())
    } else {
        Some(host)
    }
}
