//! On-disk checkpoint persistence.
//!
//! Saves go through a temp file and a rename so a crash mid-write never
//! leaves a truncated checkpoint behind. A mutex serializes writers within
//! the process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::checkpoint::{Checkpoint, now_timestamp};
use crate::error::CheckpointError;

/// Result of a backup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// `at` is the time now recorded as `last_backup_at` in the live file.
    Created { path: PathBuf, at: String },
    /// There was no checkpoint file to copy.
    SourceMissing,
}

pub struct CheckpointStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load and migrate the checkpoint. `Ok(None)` if the file does not exist.
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Checkpoint::from_json(&text).map(Some)
    }

    /// Load the checkpoint, or start a fresh one if none exists yet.
    pub fn load_or_new(&self) -> Result<Checkpoint, CheckpointError> {
        Ok(self.load()?.unwrap_or_else(Checkpoint::new))
    }

    /// Write the checkpoint atomically.
    pub fn try_save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_locked(checkpoint)
    }

    /// Caller holds `lock`.
    fn write_locked(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let json = serde_json::to_vec_pretty(checkpoint)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Write the checkpoint, logging and returning `false` on failure.
    ///
    /// Never retries; the caller decides whether a failed flush matters.
    pub fn save(&self, checkpoint: &Checkpoint) -> bool {
        match self.try_save(checkpoint) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save checkpoint {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Record the backup time in the checkpoint, then copy it to a
    /// timestamped sibling file.
    ///
    /// A file that no longer parses is copied as-is. Callers holding the
    /// checkpoint in memory should adopt the returned `at` before their next
    /// save.
    pub fn backup(&self, label: &str) -> Result<BackupOutcome, CheckpointError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No checkpoint at {} to back up", self.path.display());
                return Ok(BackupOutcome::SourceMissing);
            }
            Err(e) => return Err(e.into()),
        };

        let at = now_timestamp();
        match Checkpoint::from_json(&text) {
            Ok(mut checkpoint) => {
                checkpoint.last_backup_at = Some(at.clone());
                self.write_locked(&checkpoint)?;
            }
            Err(e) => log::warn!("Backing up unreadable checkpoint as-is: {e}"),
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = self.backup_path(label, &stamp);
        fs::copy(&self.path, &path)?;
        log::info!("Backup created: {}", path.display());
        Ok(BackupOutcome::Created { path, at })
    }

    /// `<stem>_backup_<label>_<stamp>.json` next to the checkpoint.
    pub fn backup_path(&self, label: &str, stamp: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".to_string());
        let label: String = label
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let name = if label.is_empty() {
            format!("{stem}_backup_{stamp}.json")
        } else {
            format!("{stem}_backup_{label}_{stamp}.json")
        };
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
