use std::collections::{BTreeMap, HashSet};

use reel_harvest_core::ItemKind;

use crate::checkpoint::Checkpoint;

/// Counts shown by the status report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointStats {
    pub shows: usize,
    pub series: usize,
    pub movies: usize,
    pub movies_with_video: usize,
    pub series_with_episodes: usize,
    pub episodes: usize,
    pub episodes_with_video: usize,
    /// Episodes whose `show_id` matches no show.
    pub orphan_episodes: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl CheckpointStats {
    pub fn collect(checkpoint: &Checkpoint) -> Self {
        let mut stats = Self {
            shows: checkpoint.shows.len(),
            episodes: checkpoint.episodes.len(),
            ..Self::default()
        };
        let with_episodes: HashSet<&str> = checkpoint
            .episodes
            .iter()
            .map(|e| e.show_id.as_str())
            .collect();
        let slugs: HashSet<&str> = checkpoint.shows.iter().map(|s| s.slug.as_str()).collect();

        for show in &checkpoint.shows {
            match show.kind {
                ItemKind::Movie => {
                    stats.movies += 1;
                    if show.has_video() {
                        stats.movies_with_video += 1;
                    }
                }
                ItemKind::Series => {
                    stats.series += 1;
                    if with_episodes.contains(show.slug.as_str()) {
                        stats.series_with_episodes += 1;
                    }
                }
            }
            let category = show.category.clone().unwrap_or_else(|| "Unknown".into());
            *stats.by_category.entry(category).or_insert(0) += 1;
        }
        for ep in &checkpoint.episodes {
            if ep.has_video() {
                stats.episodes_with_video += 1;
            }
            if !slugs.contains(ep.show_id.as_str()) {
                stats.orphan_episodes += 1;
            }
        }
        stats
    }

    /// Share of episodes with a resolved video, in percent.
    pub fn episode_video_coverage(&self) -> f64 {
        percent(self.episodes_with_video, self.episodes)
    }

    pub fn movie_video_coverage(&self) -> f64 {
        percent(self.movies_with_video, self.movies)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
