//! Progress display for discovery and harvest runs.
//!
//! A fixed set of spinner "slots" shows what each worker is doing, claimed
//! and released by task index, with an overall bar underneath. Finished
//! tasks are logged above the bars.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_scraper::HarvestEvent;

const TICK: Duration = Duration::from_millis(100);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .expect("static pattern")
        .tick_chars("/-\\|")
}

/// A pool of reusable spinner slots keyed by task index.
struct SpinnerPool {
    spinners: Vec<ProgressBar>,
    slot_assignments: HashMap<usize, usize>,
    free_slots: Vec<usize>,
}

impl SpinnerPool {
    fn new(mp: &MultiProgress, n: usize) -> Self {
        let style = spinner_style();
        let spinners = (0..n)
            .map(|_| {
                let pb = mp.add(ProgressBar::new_spinner());
                pb.set_style(style.clone());
                pb
            })
            .collect();
        Self {
            spinners,
            slot_assignments: HashMap::new(),
            free_slots: (0..n).rev().collect(),
        }
    }

    fn claim(&mut self, key: usize, msg: String) {
        if let Some(slot) = self.free_slots.pop() {
            self.spinners[slot].reset();
            self.spinners[slot].enable_steady_tick(TICK);
            self.spinners[slot].set_message(msg);
            self.slot_assignments.insert(key, slot);
        }
    }

    fn update(&self, key: usize, msg: String) {
        if let Some(&slot) = self.slot_assignments.get(&key) {
            self.spinners[slot].set_message(msg);
        }
    }

    fn release(&mut self, key: usize) {
        if let Some(slot) = self.slot_assignments.remove(&key) {
            self.spinners[slot].disable_steady_tick();
            self.spinners[slot].set_message("");
            self.spinners[slot].finish_and_clear();
            self.free_slots.push(slot);
        }
    }

    fn clear_all(&mut self) {
        for spinner in &self.spinners {
            spinner.disable_steady_tick();
            spinner.finish_and_clear();
        }
        self.slot_assignments.clear();
        self.free_slots = (0..self.spinners.len()).rev().collect();
    }
}

/// Renders [`HarvestEvent`]s for one command run.
pub(crate) struct HarvestProgress {
    mp: MultiProgress,
    pool: SpinnerPool,
    overall: Option<ProgressBar>,
    /// Single spinner used while discovery walks categories.
    walker: Option<ProgressBar>,
}

impl HarvestProgress {
    /// `slots` is the worker count. When `quiet` is true nothing is drawn.
    pub(crate) fn new(slots: usize, quiet: bool) -> Self {
        let mp = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        let pool = SpinnerPool::new(&mp, slots);
        Self {
            mp,
            pool,
            overall: None,
            walker: None,
        }
    }

    /// Log a line above the bars without tearing them.
    fn println(&self, line: String) {
        self.mp.suspend(|| log::info!("{line}"));
    }

    pub(crate) fn handle(&mut self, event: HarvestEvent) {
        match event {
            HarvestEvent::CategoryStarted { name } => {
                let pb = self.mp.add(ProgressBar::new_spinner());
                pb.set_style(spinner_style());
                pb.enable_steady_tick(TICK);
                pb.set_message(format!("{name}: page 1"));
                self.walker = Some(pb);
            }
            HarvestEvent::PageScanned {
                category,
                page,
                found,
                new_items,
            } => {
                if let Some(pb) = &self.walker {
                    pb.set_message(format!(
                        "{category}: page {page} ({found} listed, {new_items} new)"
                    ));
                }
            }
            HarvestEvent::CategoryDone { name, new_items } => {
                if let Some(pb) = self.walker.take() {
                    pb.finish_and_clear();
                }
                self.println(format!(
                    "  {} {:<24} {:>6} new",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                    name,
                    new_items
                ));
            }
            HarvestEvent::Planned { total } => {
                let pb = self.mp.add(ProgressBar::new(total as u64));
                pb.set_style(
                    ProgressStyle::with_template(
                        "  [{bar:30.cyan/blue}] {pos}/{len} {msg} ({elapsed_precise})",
                    )
                    .expect("static pattern")
                    .progress_chars("=> "),
                );
                self.overall = Some(pb);
            }
            HarvestEvent::TaskStarted { index, label } => {
                self.pool.claim(index, label);
            }
            HarvestEvent::TaskProgress {
                index,
                label,
                done,
                total,
            } => {
                self.pool.update(index, format!("{label} [{done}/{total}]"));
            }
            HarvestEvent::TaskSucceeded {
                index,
                label,
                episodes,
                videos,
            } => {
                self.pool.release(index);
                self.println(format!(
                    "  {} {} ({} episodes, {} videos)",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                    label,
                    episodes,
                    videos
                ));
                self.advance();
            }
            HarvestEvent::TaskFailed {
                index,
                label,
                reason,
            } => {
                self.pool.release(index);
                self.println(format!(
                    "  {} {}: {}",
                    "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                    label,
                    reason.if_supports_color(Stdout, |t| t.dimmed())
                ));
                self.advance();
            }
            HarvestEvent::Flushed {
                saved,
                shows,
                episodes,
            } => {
                if let Some(pb) = &self.overall {
                    let note = if saved { "saved" } else { "save failed" };
                    pb.set_message(format!("{note}: {shows} shows, {episodes} episodes"));
                }
            }
            HarvestEvent::Stopping => {
                self.println(format!(
                    "  {} Stopping after in-flight tasks...",
                    "\u{26a0}".if_supports_color(Stdout, |t| t.yellow())
                ));
            }
            HarvestEvent::Done { .. } => self.finish(),
        }
    }

    fn advance(&self) {
        if let Some(pb) = &self.overall {
            pb.inc(1);
        }
    }

    /// Clear every bar. Safe to call more than once.
    pub(crate) fn finish(&mut self) {
        self.pool.clear_all();
        if let Some(pb) = self.walker.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.overall.take() {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(index: usize) -> HarvestEvent {
        HarvestEvent::TaskStarted {
            index,
            label: format!("task {index}"),
        }
    }

    #[test]
    fn slots_are_reused_after_release() {
        let mut progress = HarvestProgress::new(2, true);
        progress.handle(HarvestEvent::Planned { total: 3 });
        progress.handle(started(0));
        progress.handle(started(1));
        assert!(progress.pool.free_slots.is_empty());

        progress.handle(HarvestEvent::TaskFailed {
            index: 0,
            label: "task 0".into(),
            reason: "page unavailable".into(),
        });
        assert_eq!(progress.pool.free_slots.len(), 1);
        progress.handle(started(2));
        // task 0 held the first slot
        assert_eq!(progress.pool.slot_assignments.get(&2), Some(&0));
    }

    #[test]
    fn overall_bar_counts_finished_tasks() {
        let mut progress = HarvestProgress::new(1, true);
        progress.handle(HarvestEvent::Planned { total: 2 });
        progress.handle(started(0));
        progress.handle(HarvestEvent::TaskSucceeded {
            index: 0,
            label: "task 0".into(),
            episodes: 3,
            videos: 3,
        });
        assert_eq!(progress.overall.as_ref().map(|pb| pb.position()), Some(1));

        progress.handle(HarvestEvent::Done {
            succeeded: 1,
            failed: 0,
            pending: 1,
        });
        assert!(progress.overall.is_none());
        assert_eq!(progress.pool.free_slots.len(), 1);
    }
}
