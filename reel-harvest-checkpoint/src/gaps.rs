//! Gap analysis: what a checkpoint still lacks.
//!
//! [`analyze`] is a pure function of the checkpoint. A resumed run never
//! consults a task log; it re-derives the outstanding work from whatever the
//! checkpoint currently holds.

use std::collections::HashMap;

use reel_harvest_core::{CatalogItem, Episode, ItemKind};

use crate::checkpoint::Checkpoint;

/// Default largest shortfall (stated minus recorded episodes) that is still
/// treated as an incomplete scrape rather than inflated catalog metadata.
pub const DEFAULT_VERIFY_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapConfig {
    pub verify_threshold: u32,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
        }
    }
}

/// Rough cost of closing a gap, by the number of page fetches it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GapCost {
    /// At most two fetches.
    Cheap,
    /// At most twenty fetches.
    Moderate,
    /// More than twenty, or unknown.
    Expensive,
}

impl GapCost {
    pub fn classify(estimated_fetches: usize) -> Self {
        match estimated_fetches {
            0..=2 => GapCost::Cheap,
            3..=20 => GapCost::Moderate,
            _ => GapCost::Expensive,
        }
    }
}

/// A catalog item that has never been scraped in detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGap {
    pub item: CatalogItem,
    pub estimated_fetches: usize,
    pub cost: GapCost,
}

/// Episodes of one series that still lack a resolved video URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesVideoGap {
    pub show_id: String,
    pub episodes: Vec<Episode>,
    pub estimated_fetches: usize,
    pub cost: GapCost,
}

/// A series whose recorded episode count falls short of the stated total.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortfallGap {
    pub show: CatalogItem,
    pub recorded: u32,
    pub stated: u32,
    pub existing: Vec<Episode>,
    pub cost: GapCost,
}

impl ShortfallGap {
    pub fn shortfall(&self) -> u32 {
        self.stated - self.recorded
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapReport {
    /// Series with zero recorded episodes.
    pub series_without_episodes: Vec<ItemGap>,
    /// Movies without a resolved video URL.
    pub movies_missing_video: Vec<ItemGap>,
    /// Every episode without a resolved video URL.
    pub episodes_missing_video: Vec<Episode>,
    /// The same episodes grouped by series.
    pub series_missing_video: Vec<SeriesVideoGap>,
    /// Small shortfalls worth re-scraping.
    pub verification_candidates: Vec<ShortfallGap>,
    /// Large shortfalls, likely bad metadata. Reported, never enqueued.
    pub manual_review: Vec<ShortfallGap>,
}

impl GapReport {
    /// Items never scraped in detail, series first.
    pub fn new_items(&self) -> impl Iterator<Item = &ItemGap> {
        self.series_without_episodes
            .iter()
            .chain(self.movies_missing_video.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.series_without_episodes.is_empty()
            && self.movies_missing_video.is_empty()
            && self.episodes_missing_video.is_empty()
            && self.verification_candidates.is_empty()
    }

    /// Fetches needed to close every actionable gap.
    pub fn estimated_fetches(&self) -> usize {
        self.new_items().map(|g| g.estimated_fetches).sum::<usize>()
            + self
                .series_missing_video
                .iter()
                .map(|g| g.estimated_fetches)
                .sum::<usize>()
            + self
                .verification_candidates
                .iter()
                .map(|g| 1 + g.shortfall() as usize)
                .sum::<usize>()
    }

    /// Actionable gaps per cost class.
    pub fn cost_breakdown(&self) -> HashMap<GapCost, usize> {
        let mut counts = HashMap::new();
        let costs = self
            .new_items()
            .map(|g| g.cost)
            .chain(self.series_missing_video.iter().map(|g| g.cost))
            .chain(self.verification_candidates.iter().map(|g| g.cost));
        for cost in costs {
            *counts.entry(cost).or_insert(0) += 1;
        }
        counts
    }
}

/// Compute the outstanding work for a checkpoint.
pub fn analyze(checkpoint: &Checkpoint, config: &GapConfig) -> GapReport {
    let mut by_show: HashMap<&str, Vec<&Episode>> = HashMap::new();
    for ep in &checkpoint.episodes {
        by_show.entry(ep.show_id.as_str()).or_default().push(ep);
    }

    let mut report = GapReport::default();

    for show in &checkpoint.shows {
        match show.kind {
            ItemKind::Movie => {
                if !show.has_video() {
                    report.movies_missing_video.push(ItemGap {
                        item: show.clone(),
                        estimated_fetches: 1,
                        cost: GapCost::Cheap,
                    });
                }
            }
            ItemKind::Series => {
                let episodes = by_show.get(show.slug.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let recorded = episodes.len() as u32;
                if recorded == 0 {
                    let stated = show.total_episodes.unwrap_or(0) as usize;
                    report.series_without_episodes.push(ItemGap {
                        item: show.clone(),
                        estimated_fetches: 1 + stated,
                        cost: GapCost::Expensive,
                    });
                    continue;
                }
                let Some(stated) = show.total_episodes else {
                    continue;
                };
                if recorded >= stated {
                    continue;
                }
                let shortfall = stated - recorded;
                let gap = ShortfallGap {
                    show: show.clone(),
                    recorded,
                    stated,
                    existing: episodes.iter().map(|&e| e.clone()).collect(),
                    cost: GapCost::classify(1 + shortfall as usize),
                };
                if shortfall <= config.verify_threshold {
                    report.verification_candidates.push(gap);
                } else {
                    report.manual_review.push(gap);
                }
            }
        }
    }

    let mut grouped: Vec<SeriesVideoGap> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    for ep in checkpoint.episodes.iter().filter(|e| !e.has_video()) {
        report.episodes_missing_video.push(ep.clone());
        let idx = *group_index.entry(ep.show_id.as_str()).or_insert_with(|| {
            grouped.push(SeriesVideoGap {
                show_id: ep.show_id.clone(),
                episodes: Vec::new(),
                estimated_fetches: 0,
                cost: GapCost::Cheap,
            });
            grouped.len() - 1
        });
        grouped[idx].episodes.push(ep.clone());
    }
    for gap in &mut grouped {
        gap.estimated_fetches = gap.episodes.len();
        gap.cost = GapCost::classify(gap.estimated_fetches);
    }
    report.series_missing_video = grouped;

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_classes() {
        assert_eq!(GapCost::classify(1), GapCost::Cheap);
        assert_eq!(GapCost::classify(2), GapCost::Cheap);
        assert_eq!(GapCost::classify(3), GapCost::Moderate);
        assert_eq!(GapCost::classify(20), GapCost::Moderate);
        assert_eq!(GapCost::classify(21), GapCost::Expensive);
    }
}
