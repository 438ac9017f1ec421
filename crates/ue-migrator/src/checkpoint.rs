//! Resumable migration state.
//!
//! A [`MigrationJob`] owns the [`Checkpoint`] for one run and moves each table
//! through `pending -> in_progress -> completed | failed`. The checkpoint is
//! written after every table so an interrupted run can resume by skipping
//! completed tables. Failed tables are retried on resume.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MigrateError;
use crate::platform::Platform;

/// Overall run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Tables remain.
    InProgress,
    /// Every table completed.
    Completed,
    /// Every table was attempted; some failed.
    CompletedWithErrors,
}

/// The persisted progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Platform being migrated.
    pub platform: Platform,
    /// When the first run started.
    pub started_at: DateTime<Utc>,
    /// When the record last changed.
    pub last_updated: DateTime<Utc>,
    /// Tables copied successfully, in completion order.
    pub completed_tables: Vec<String>,
    /// Failed tables and the error text.
    pub failed_tables: BTreeMap<String, String>,
    /// Rows copied per completed table.
    pub row_counts: BTreeMap<String, u64>,
    /// Tables in the current plan.
    pub total_tables: usize,
    /// Rows copied across completed tables.
    pub total_rows: u64,
    /// Overall status.
    pub status: RunStatus,
}

impl Checkpoint {
    /// Creates an empty record.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        let now = Utc::now();
        Self {
            platform,
            started_at: now,
            last_updated: now,
            completed_tables: Vec::new(),
            failed_tables: BTreeMap::new(),
            row_counts: BTreeMap::new(),
            total_tables: 0,
            total_rows: 0,
            status: RunStatus::InProgress,
        }
    }

    /// Returns `true` if `table` completed in this or an earlier run.
    #[must_use]
    pub fn is_completed(&self, table: &str) -> bool {
        self.completed_tables.iter().any(|t| t == table)
    }

    /// Reads a checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Checkpoint`] if the file cannot be read and
    /// [`MigrateError::CheckpointFormat`] if it is not a checkpoint.
    pub fn load(path: &Utf8Path) -> Result<Self, MigrateError> {
        let text = std::fs::read_to_string(path).map_err(|source| MigrateError::checkpoint(path, source))?;
        serde_json::from_str(&text).map_err(|source| MigrateError::CheckpointFormat {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes the checkpoint, replacing the file atomically.
    ///
    /// The JSON goes to a sibling temporary file that is then renamed over
    /// `path`, so a crash never leaves a truncated checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Checkpoint`] if the directory or file cannot be
    /// written.
    pub fn save(&self, path: &Utf8Path) -> Result<(), MigrateError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| MigrateError::checkpoint(parent, source))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| MigrateError::CheckpointFormat {
            path: path.to_owned(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| MigrateError::checkpoint(&tmp, source))?;
        std::fs::rename(&tmp, path).map_err(|source| MigrateError::checkpoint(path, source))
    }
}

/// Where a table stands in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    /// Not yet attempted.
    Pending,
    /// Being copied.
    InProgress,
    /// Copied, now or in an earlier run.
    Completed,
    /// Attempted and failed.
    Failed,
}

/// The explicit per-table state machine over a [`Checkpoint`].
///
/// # Examples
///
/// ```
/// use ue_migrator::{MigrationJob, Platform, TableState};
///
/// let mut job = MigrationJob::in_memory(Platform::Ue);
/// let pending = job.plan(&["organizations".to_owned(), "members".to_owned()]);
/// assert_eq!(pending.len(), 2);
///
/// job.begin("organizations");
/// job.complete("organizations", 12)?;
/// job.begin("members");
/// job.fail("members", "value too long for type character varying(50)")?;
///
/// let checkpoint = job.finish()?;
/// assert_eq!(checkpoint.total_rows, 12);
/// assert_eq!(job.state("members"), Some(TableState::Failed));
/// # Ok::<(), ue_migrator::MigrateError>(())
/// ```
#[derive(Debug)]
pub struct MigrationJob {
    path: Option<Utf8PathBuf>,
    checkpoint: Checkpoint,
    states: BTreeMap<String, TableState>,
}

impl MigrationJob {
    /// Opens a job persisted at `path`.
    ///
    /// With `resume`, an existing checkpoint is loaded and its completed
    /// tables are skipped by [`plan`](Self::plan); otherwise the run starts
    /// fresh and overwrites the file on the first save.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Checkpoint::load`] when resuming from an
    /// existing file.
    pub fn open(path: &Utf8Path, platform: Platform, resume: bool) -> Result<Self, MigrateError> {
        let checkpoint = if resume && path.exists() {
            let loaded = Checkpoint::load(path)?;
            info!(
                path = %path,
                completed = loaded.completed_tables.len(),
                failed = loaded.failed_tables.len(),
                "Resuming from checkpoint"
            );
            loaded
        } else {
            Checkpoint::new(platform)
        };

        Ok(Self {
            path: Some(path.to_owned()),
            checkpoint,
            states: BTreeMap::new(),
        })
    }

    /// Creates a job that never touches the filesystem (dry runs, tests).
    #[must_use]
    pub fn in_memory(platform: Platform) -> Self {
        Self {
            path: None,
            checkpoint: Checkpoint::new(platform),
            states: BTreeMap::new(),
        }
    }

    /// Keeps the loaded state but stops persisting it.
    #[must_use]
    pub fn detach(mut self) -> Self {
        self.path = None;
        self
    }

    /// Registers the run's tables and returns the ones still to do, in order.
    pub fn plan(&mut self, tables: &[String]) -> Vec<String> {
        self.checkpoint.total_tables = tables.len();
        self.checkpoint.status = RunStatus::InProgress;

        tables
            .iter()
            .filter_map(|table| {
                if self.checkpoint.is_completed(table) {
                    debug!(table = %table, "Already completed; skipping");
                    self.states.insert(table.clone(), TableState::Completed);
                    None
                } else {
                    self.states.insert(table.clone(), TableState::Pending);
                    Some(table.clone())
                }
            })
            .collect()
    }

    /// Marks a table as being copied.
    pub fn begin(&mut self, table: &str) {
        self.states.insert(table.to_owned(), TableState::InProgress);
    }

    /// Records a successful table and persists.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Checkpoint`] if the checkpoint cannot be written.
    pub fn complete(&mut self, table: &str, rows: u64) -> Result<(), MigrateError> {
        self.states.insert(table.to_owned(), TableState::Completed);
        self.checkpoint.failed_tables.remove(table);
        if !self.checkpoint.is_completed(table) {
            self.checkpoint.completed_tables.push(table.to_owned());
        }
        self.checkpoint.row_counts.insert(table.to_owned(), rows);
        self.checkpoint.total_rows = self.checkpoint.row_counts.values().sum();
        self.persist()
    }

    /// Records a failed table with its error text and persists.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Checkpoint`] if the checkpoint cannot be written.
    pub fn fail(&mut self, table: &str, error: &str) -> Result<(), MigrateError> {
        self.states.insert(table.to_owned(), TableState::Failed);
        self.checkpoint
            .failed_tables
            .insert(table.to_owned(), error.to_owned());
        self.persist()
    }

    /// Sets the final status and persists.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Checkpoint`] if the checkpoint cannot be written.
    pub fn finish(&mut self) -> Result<&Checkpoint, MigrateError> {
        let unfinished = self
            .states
            .values()
            .any(|s| matches!(s, TableState::Pending | TableState::InProgress));
        self.checkpoint.status = if unfinished {
            RunStatus::InProgress
        } else if self.checkpoint.failed_tables.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        };
        self.persist()?;
        Ok(&self.checkpoint)
    }

    /// The state of a table in this run.
    #[must_use]
    pub fn state(&self, table: &str) -> Option<TableState> {
        self.states.get(table).copied()
    }

    /// The current record.
    #[must_use]
    pub const fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// The checkpoint path, if persisted.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    fn persist(&mut self) -> Result<(), MigrateError> {
        self.checkpoint.last_updated = Utc::now();
        match &self.path {
            Some(path) => self.checkpoint.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn scratch() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("state").join(Platform::Ue.checkpoint_file())).unwrap();
        (dir, path)
    }

    #[test]
    fn test_checkpoint_json_fields() {
        let mut checkpoint = Checkpoint::new(Platform::Abr);
        checkpoint.failed_tables.insert("claims".to_owned(), "boom".to_owned());
        let value = serde_json::to_value(&checkpoint).unwrap();
        for key in [
            "platform",
            "started_at",
            "last_updated",
            "completed_tables",
            "failed_tables",
            "row_counts",
            "total_tables",
            "total_rows",
            "status",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["platform"], "abr");
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["failed_tables"]["claims"], "boom");
    }

    #[test]
    fn test_save_and_resume() {
        let (_dir, path) = scratch();

        let mut job = MigrationJob::open(&path, Platform::Ue, false).unwrap();
        job.plan(&tables(&["organizations", "members", "claims"]));
        job.begin("organizations");
        job.complete("organizations", 3).unwrap();
        job.begin("members");
        job.fail("members", "duplicate key").unwrap();
        drop(job);

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let mut resumed = MigrationJob::open(&path, Platform::Ue, true).unwrap();
        let pending = resumed.plan(&tables(&["organizations", "members", "claims"]));
        assert_eq!(pending, tables(&["members", "claims"]));
        assert_eq!(resumed.state("organizations"), Some(TableState::Completed));
        assert_eq!(resumed.checkpoint().failed_tables["members"], "duplicate key");
    }

    #[test]
    fn test_without_resume_starts_fresh() {
        let (_dir, path) = scratch();
        let mut job = MigrationJob::open(&path, Platform::Ue, false).unwrap();
        job.plan(&tables(&["a"]));
        job.complete("a", 1).unwrap();

        let mut fresh = MigrationJob::open(&path, Platform::Ue, false).unwrap();
        assert_eq!(fresh.plan(&tables(&["a"])), tables(&["a"]));
    }

    #[test]
    fn test_retry_clears_failure() {
        let mut job = MigrationJob::in_memory(Platform::Ue);
        job.plan(&tables(&["a"]));
        job.fail("a", "timeout").unwrap();
        job.complete("a", 5).unwrap();
        let checkpoint = job.finish().unwrap();
        assert!(checkpoint.failed_tables.is_empty());
        assert_eq!(checkpoint.status, RunStatus::Completed);
    }

    #[test]
    fn test_finish_status() {
        let mut job = MigrationJob::in_memory(Platform::Ue);
        job.plan(&tables(&["a", "b"]));
        job.complete("a", 1).unwrap();
        assert_eq!(job.finish().unwrap().status, RunStatus::InProgress);

        job.fail("b", "boom").unwrap();
        assert_eq!(job.finish().unwrap().status, RunStatus::CompletedWithErrors);
    }

    #[test]
    fn test_corrupt_checkpoint_is_error() {
        let (_dir, path) = scratch();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{").unwrap();
        let err = MigrationJob::open(&path, Platform::Ue, true).unwrap_err();
        assert!(matches!(err, MigrateError::CheckpointFormat { .. }));
        assert!(err.is_fatal());
    }
}
