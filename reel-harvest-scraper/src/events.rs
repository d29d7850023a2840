/// Progress events emitted during discovery and harvest, consumed by the CLI.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    /// Discovery started walking a category.
    CategoryStarted { name: String },
    /// One listing page was scanned.
    PageScanned {
        category: String,
        page: u32,
        found: usize,
        new_items: usize,
    },
    /// A category walk ended.
    CategoryDone { name: String, new_items: usize },
    /// The task list is ready.
    Planned { total: usize },
    /// A task was handed to a worker.
    TaskStarted { index: usize, label: String },
    /// A nested page fetch inside a task (episode video pages).
    TaskProgress {
        index: usize,
        label: String,
        done: usize,
        total: usize,
    },
    TaskSucceeded {
        index: usize,
        label: String,
        episodes: usize,
        videos: usize,
    },
    /// A task failed (non-fatal). The run continues.
    TaskFailed {
        index: usize,
        label: String,
        reason: String,
    },
    /// The accumulator was written to the checkpoint file.
    Flushed {
        saved: bool,
        shows: usize,
        episodes: usize,
    },
    /// The stop flag was observed; no further tasks will start.
    Stopping,
    /// The run finished, cleanly or not.
    Done {
        succeeded: usize,
        failed: usize,
        pending: usize,
    },
}
