//! In-memory, ID-indexed view of a checkpoint owned by a single run.
//!
//! Every merge is an upsert keyed by stable identifier: show slug for
//! catalog items, episode ID for episodes. The last write for a key wins.

use std::collections::{HashMap, HashSet};

use reel_harvest_core::{CatalogItem, Episode};

use crate::checkpoint::{Checkpoint, Phase, now_timestamp};
use crate::store::CheckpointStore;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    checkpoint: Checkpoint,
    show_index: HashMap<String, usize>,
    episode_index: HashMap<String, usize>,
    show_urls: HashSet<String>,
    episode_urls: HashSet<String>,
}

impl Accumulator {
    /// Index a checkpoint. Duplicate keys already in the file collapse to
    /// their last occurrence.
    pub fn new(mut checkpoint: Checkpoint) -> Self {
        let dup_shows = dedupe_shows(&mut checkpoint);
        let dup_episodes = dedupe_episodes(&mut checkpoint);
        if dup_shows + dup_episodes > 0 {
            log::debug!(
                "Collapsed {dup_shows} duplicate shows and {dup_episodes} duplicate episodes"
            );
        }
        let show_index = checkpoint
            .shows
            .iter()
            .enumerate()
            .map(|(i, s)| (s.slug.clone(), i))
            .collect();
        let episode_index = checkpoint
            .episodes
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let show_urls = checkpoint.shows.iter().map(|s| s.url.clone()).collect();
        let episode_urls = checkpoint.episodes.iter().map(|e| e.url.clone()).collect();
        Self {
            checkpoint,
            show_index,
            episode_index,
            show_urls,
            episode_urls,
        }
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn into_checkpoint(self) -> Checkpoint {
        self.checkpoint
    }

    pub fn show(&self, slug: &str) -> Option<&CatalogItem> {
        self.show_index.get(slug).map(|&i| &self.checkpoint.shows[i])
    }

    pub fn episode(&self, id: &str) -> Option<&Episode> {
        self.episode_index
            .get(id)
            .map(|&i| &self.checkpoint.episodes[i])
    }

    pub fn knows_show_url(&self, url: &str) -> bool {
        self.show_urls.contains(url)
    }

    pub fn knows_episode_url(&self, url: &str) -> bool {
        self.episode_urls.contains(url)
    }

    pub fn show_count(&self) -> usize {
        self.checkpoint.shows.len()
    }

    pub fn episode_count(&self) -> usize {
        self.checkpoint.episodes.len()
    }

    /// Insert or replace a catalog item by slug.
    pub fn upsert_item(&mut self, item: CatalogItem) -> Upsert {
        self.show_urls.insert(item.url.clone());
        match self.show_index.get(&item.slug) {
            Some(&i) => {
                let slot = &mut self.checkpoint.shows[i];
                if *slot == item {
                    Upsert::Unchanged
                } else {
                    *slot = item;
                    Upsert::Updated
                }
            }
            None => {
                self.show_index
                    .insert(item.slug.clone(), self.checkpoint.shows.len());
                self.checkpoint.shows.push(item);
                Upsert::Inserted
            }
        }
    }

    /// Insert or replace an episode by ID.
    pub fn upsert_episode(&mut self, episode: Episode) -> Upsert {
        self.episode_urls.insert(episode.url.clone());
        match self.episode_index.get(&episode.id) {
            Some(&i) => {
                let slot = &mut self.checkpoint.episodes[i];
                if *slot == episode {
                    Upsert::Unchanged
                } else {
                    *slot = episode;
                    Upsert::Updated
                }
            }
            None => {
                self.episode_index
                    .insert(episode.id.clone(), self.checkpoint.episodes.len());
                self.checkpoint.episodes.push(episode);
                Upsert::Inserted
            }
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.checkpoint.phase = phase;
    }

    pub fn set_last_detail_index(&mut self, index: Option<usize>) {
        self.checkpoint.last_detail_index = index;
    }

    pub fn set_last_backup_at(&mut self, at: String) {
        self.checkpoint.last_backup_at = Some(at);
    }

    pub fn mark_discovery_run(&mut self) {
        self.checkpoint.discovery_last_run = Some(now_timestamp());
    }

    /// Stamp and persist the current state. Returns the store's verdict.
    pub fn flush(&mut self, store: &CheckpointStore) -> bool {
        self.checkpoint.touch();
        store.save(&self.checkpoint)
    }
}

impl From<Checkpoint> for Accumulator {
    fn from(checkpoint: Checkpoint) -> Self {
        Self::new(checkpoint)
    }
}

/// Collapse duplicate episode IDs. The surviving record is the last one seen,
/// kept at the position of the first. Returns the number removed.
pub fn dedupe_episodes(checkpoint: &mut Checkpoint) -> usize {
    dedupe_by_key(&mut checkpoint.episodes, |e| e.id.clone())
}

/// Collapse duplicate show slugs, last occurrence wins.
pub fn dedupe_shows(checkpoint: &mut Checkpoint) -> usize {
    dedupe_by_key(&mut checkpoint.shows, |s| s.slug.clone())
}

fn dedupe_by_key<T>(records: &mut Vec<T>, key: impl Fn(&T) -> String) -> usize {
    let before = records.len();
    let mut position: HashMap<String, usize> = HashMap::with_capacity(before);
    let mut kept: Vec<Option<T>> = Vec::with_capacity(before);
    for record in records.drain(..) {
        let k = key(&record);
        match position.get(&k) {
            Some(&i) => kept[i] = Some(record),
            None => {
                position.insert(k, kept.len());
                kept.push(Some(record));
            }
        }
    }
    records.extend(kept.into_iter().flatten());
    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_harvest_core::ItemKind;

    fn ep(show: &str, n: u32, video: Option<&str>) -> Episode {
        let mut e = Episode::numbered(show, 1, n, format!("https://x/{show}/{n}"));
        e.video_url = video.map(str::to_string);
        e
    }

    #[test]
    fn dedupe_keeps_last_value_at_first_position() {
        let mut cp = Checkpoint::default();
        cp.episodes = vec![
            ep("a", 1, None),
            ep("a", 2, None),
            ep("a", 1, Some("v1")),
        ];
        assert_eq!(dedupe_episodes(&mut cp), 1);
        assert_eq!(cp.episodes.len(), 2);
        assert_eq!(cp.episodes[0].id, "a_ep1");
        assert_eq!(cp.episodes[0].video_url.as_deref(), Some("v1"));
        assert_eq!(cp.episodes[1].id, "a_ep2");
    }

    #[test]
    fn upserts_report_what_changed() {
        let mut acc = Accumulator::new(Checkpoint::default());
        assert_eq!(acc.upsert_episode(ep("a", 1, None)), Upsert::Inserted);
        assert_eq!(acc.upsert_episode(ep("a", 1, None)), Upsert::Unchanged);
        assert_eq!(acc.upsert_episode(ep("a", 1, Some("v"))), Upsert::Updated);
        assert_eq!(acc.episode_count(), 1);
        assert_eq!(
            acc.episode("a_ep1").and_then(|e| e.video_url.as_deref()),
            Some("v")
        );

        let item = CatalogItem::new("a", "A", "https://x/a", ItemKind::Series);
        assert_eq!(acc.upsert_item(item.clone()), Upsert::Inserted);
        assert!(acc.knows_show_url("https://x/a"));
        assert_eq!(acc.upsert_item(item), Upsert::Unchanged);
        assert_eq!(acc.show_count(), 1);
    }

    #[test]
    fn last_write_wins_for_conflicting_results() {
        let mut acc = Accumulator::new(Checkpoint::default());
        acc.upsert_episode(ep("a", 3, Some("first")));
        acc.upsert_episode(ep("a", 3, Some("second")));
        assert_eq!(acc.episode_count(), 1);
        assert_eq!(
            acc.episode("a_ep3").and_then(|e| e.video_url.as_deref()),
            Some("second")
        );
    }
}
