use std::path::Path;

/// Lifecycle of one harvest task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Never dispatched (the run stopped first).
    Pending,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub label: String,
    pub state: TaskState,
}

/// What a harvest run did, task by task.
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub outcomes: Vec<TaskOutcome>,
    pub items_updated: usize,
    pub episodes_inserted: usize,
    pub episodes_updated: usize,
    pub videos_resolved: usize,
    pub flushes: usize,
    pub failed_flushes: usize,
    pub interrupted: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
}

impl HarvestReport {
    pub fn summary(&self) -> HarvestSummary {
        let mut summary = HarvestSummary::default();
        for outcome in &self.outcomes {
            match outcome.state {
                TaskState::Succeeded => summary.succeeded += 1,
                TaskState::Failed(_) => summary.failed += 1,
                TaskState::Pending => summary.pending += 1,
            }
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.state {
            TaskState::Failed(reason) => Some((o.label.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Write the report to a file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::fs::File::create(path)?;
        let summary = self.summary();

        writeln!(file, "=== Harvest Log ===")?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        if self.interrupted {
            writeln!(file, "Run was interrupted")?;
        }
        writeln!(file)?;
        writeln!(file, "--- Summary ---")?;
        writeln!(
            file,
            "Tasks: {} succeeded, {} failed, {} not started",
            summary.succeeded, summary.failed, summary.pending
        )?;
        writeln!(file, "Items updated: {}", self.items_updated)?;
        writeln!(
            file,
            "Episodes: {} new, {} updated",
            self.episodes_inserted, self.episodes_updated
        )?;
        writeln!(file, "Videos resolved: {}", self.videos_resolved)?;
        writeln!(
            file,
            "Checkpoint saves: {} ({} failed)",
            self.flushes, self.failed_flushes
        )?;
        writeln!(file)?;
        writeln!(file, "--- Details ---")?;
        writeln!(file)?;

        for outcome in &self.outcomes {
            match &outcome.state {
                TaskState::Succeeded => writeln!(file, "[OK] {}", outcome.label)?,
                TaskState::Failed(reason) => {
                    writeln!(file, "[FAILED] {}: {}", outcome.label, reason)?
                }
                TaskState::Pending => {
                    writeln!(file, "[PENDING] {}", outcome.label)?
                }
            }
        }

        Ok(())
    }
}
