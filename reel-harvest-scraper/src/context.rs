//! Per-run cancellation and progress plumbing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::events::HarvestEvent;

/// Stop flag plus event sender for one discovery or harvest run.
///
/// Cloning shares both. Separate runs get separate contexts, so several can
/// coexist in one process (tests do this).
#[derive(Debug, Clone)]
pub struct HarvestContext {
    stop: Arc<AtomicBool>,
    events: Option<mpsc::UnboundedSender<HarvestEvent>>,
}

impl HarvestContext {
    pub fn new(events: mpsc::UnboundedSender<HarvestEvent>) -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            events: Some(events),
        }
    }

    /// A context that obeys an existing stop flag, so one Ctrl-C handler can
    /// cover a sequence of runs.
    pub fn with_stop_flag(
        events: mpsc::UnboundedSender<HarvestEvent>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            stop,
            events: Some(events),
        }
    }

    /// A context whose events go nowhere.
    pub fn silent() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            events: None,
        }
    }

    /// The shared flag, for signal handlers and the worker pool.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn emit(&self, event: HarvestEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
