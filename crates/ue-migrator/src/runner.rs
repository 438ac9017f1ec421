//! The migration run: discovery, ordering, copying, and validation.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ue_core::{FxHashSet, MigrateConfig};

use crate::adapt::adapt_row;
use crate::checkpoint::{MigrationJob, RunStatus};
use crate::database::{Database, Row, RowCursor};
use crate::error::MigrateError;
use crate::matching::match_columns;
use crate::order::topological_order;
use crate::platform::Platform;
use crate::validate::{TableCount, ValidationReport};

/// Settings for one run, usually taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Platform being migrated.
    pub platform: Platform,
    /// Read-only rehearsal: count rows, write nothing.
    pub dry_run: bool,
    /// Skip tables the checkpoint lists as completed.
    pub resume: bool,
    /// Restrict the run to these tables.
    pub tables: Option<Vec<String>>,
    /// Rows per INSERT round-trip.
    pub batch_size: usize,
    /// Directory holding the checkpoint file.
    pub checkpoint_dir: Utf8PathBuf,
}

impl RunOptions {
    /// Options with batch size and checkpoint directory from `config`.
    #[must_use]
    pub fn new(platform: Platform, config: &MigrateConfig) -> Self {
        Self {
            platform,
            dry_run: false,
            resume: false,
            tables: None,
            batch_size: config.batch_size,
            checkpoint_dir: config.checkpoint_dir.clone(),
        }
    }

    /// Path of this platform's checkpoint file.
    #[must_use]
    pub fn checkpoint_path(&self) -> Utf8PathBuf {
        self.checkpoint_dir.join(self.platform.checkpoint_file())
    }
}

/// What happened to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Copied in this run.
    Completed,
    /// Failed in this run; see the error.
    Failed,
    /// Completed in an earlier run.
    AlreadyCompleted,
    /// Counted only (dry run).
    DryRun,
}

/// Per-table result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    /// Table name.
    pub table: String,
    /// Outcome.
    pub status: TableStatus,
    /// Source rows read (or counted, for a dry run).
    pub rows: u64,
    /// Rows actually inserted; conflicts are not counted.
    pub inserted: u64,
    /// Error text for failed tables.
    pub error: Option<String>,
}

/// The result of [`Migrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Platform migrated.
    pub platform: Platform,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Outcomes in load order.
    pub tables: Vec<TableOutcome>,
    /// Rows read in this run.
    pub total_rows: u64,
    /// Final checkpoint status.
    pub status: RunStatus,
    /// Checkpoint written, if any.
    pub checkpoint: Option<Utf8PathBuf>,
}

impl RunSummary {
    /// Outcomes of tables that failed.
    pub fn failed(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables.iter().filter(|t| t.status == TableStatus::Failed)
    }

    /// Looks up a table's outcome.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.table == name)
    }
}

struct TableCopy {
    rows: u64,
    inserted: u64,
}

/// Copies rows from a source database into a target database.
///
/// A run discovers the tables both sides share, orders them by the target's
/// foreign keys, and copies them one at a time. A table that fails is
/// recorded and the run moves on; only connection and checkpoint problems
/// end a run early.
#[derive(Debug)]
pub struct Migrator<'a, S, T> {
    source: &'a S,
    target: &'a T,
    config: &'a MigrateConfig,
    options: RunOptions,
}

impl<'a, S: Database, T: Database> Migrator<'a, S, T> {
    /// Creates a migrator.
    #[must_use]
    pub const fn new(source: &'a S, target: &'a T, config: &'a MigrateConfig, options: RunOptions) -> Self {
        Self {
            source,
            target,
            config,
            options,
        }
    }

    /// The run options.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    fn schema(&self) -> &str {
        &self.config.schema
    }

    fn is_excluded(&self, table: &str) -> bool {
        self.options.platform.bookkeeping_tables().contains(&table)
            || self.config.excluded_tables.iter().any(|t| t == table)
    }

    /// Tables present on both sides, minus exclusions, in load order.
    ///
    /// # Errors
    ///
    /// Returns query errors from either side.
    pub async fn discover(&self) -> Result<Vec<String>, MigrateError> {
        let schema = self.schema();
        let source: FxHashSet<String> = self.source.tables(schema).await?.into_iter().collect();
        let mut tables: Vec<String> = self
            .target
            .tables(schema)
            .await?
            .into_iter()
            .filter(|t| source.contains(t) && !self.is_excluded(t))
            .collect();

        if let Some(only) = &self.options.tables {
            for name in only.iter().filter(|n| !tables.contains(*n)) {
                warn!(table = %name, "Requested table is not present on both sides");
            }
            tables.retain(|t| only.contains(t));
        }

        let dependencies = self.target.dependencies(schema).await?;
        let ordered = topological_order(&tables, &dependencies);
        debug!(tables = ordered.len(), "Discovered tables");
        Ok(ordered)
    }

    /// Runs the migration.
    ///
    /// # Errors
    ///
    /// Returns discovery errors, trigger toggling errors, and checkpoint
    /// errors. Per-table failures are recorded in the summary instead.
    pub async fn run(&self) -> Result<RunSummary, MigrateError> {
        let options = &self.options;
        let tables = self.discover().await?;
        info!(
            platform = %options.platform,
            tables = tables.len(),
            dry_run = options.dry_run,
            resume = options.resume,
            "Starting migration"
        );

        let path = options.checkpoint_path();
        let mut job = MigrationJob::open(&path, options.platform, options.resume)?;
        if options.dry_run {
            job = job.detach();
        }

        let pending = job.plan(&tables);
        let mut outcomes: Vec<TableOutcome> = tables
            .iter()
            .filter(|t| !pending.contains(*t))
            .map(|t| TableOutcome {
                table: t.clone(),
                status: TableStatus::AlreadyCompleted,
                rows: job.checkpoint().row_counts.get(t).copied().unwrap_or(0),
                inserted: 0,
                error: None,
            })
            .collect();

        if !options.dry_run {
            self.target.set_triggers_enabled(false).await?;
        }
        let copied = self.copy_tables(&mut job, &pending, &mut outcomes).await;
        if !options.dry_run {
            if let Err(err) = self.target.set_triggers_enabled(true).await {
                warn!(error = %err, "Failed to restore trigger enforcement");
            }
        }
        copied?;

        outcomes.sort_by_key(|o| tables.iter().position(|t| *t == o.table));

        let status = job.finish()?.status;
        let summary = RunSummary {
            platform: options.platform,
            dry_run: options.dry_run,
            total_rows: outcomes
                .iter()
                .filter(|o| o.status != TableStatus::AlreadyCompleted)
                .map(|o| o.rows)
                .sum(),
            tables: outcomes,
            status,
            checkpoint: job.path().map(Utf8Path::to_path_buf),
        };

        let failed = summary.failed().count();
        if failed == 0 {
            info!(rows = summary.total_rows, "Migration finished");
        } else {
            warn!(rows = summary.total_rows, failed, "Migration finished with failed tables");
        }
        Ok(summary)
    }

    async fn copy_tables(
        &self,
        job: &mut MigrationJob,
        pending: &[String],
        outcomes: &mut Vec<TableOutcome>,
    ) -> Result<(), MigrateError> {
        for table in pending {
            job.begin(table);
            match self.migrate_table(table).await {
                Ok(copy) => {
                    job.complete(table, copy.rows)?;
                    outcomes.push(TableOutcome {
                        table: table.clone(),
                        status: if self.options.dry_run {
                            TableStatus::DryRun
                        } else {
                            TableStatus::Completed
                        },
                        rows: copy.rows,
                        inserted: copy.inserted,
                        error: None,
                    });
                }
                Err(err) => {
                    error!(table = %table, error = %err, "Table failed");
                    let message = err.to_string();
                    job.fail(table, &message)?;
                    outcomes.push(TableOutcome {
                        table: table.clone(),
                        status: TableStatus::Failed,
                        rows: 0,
                        inserted: 0,
                        error: Some(message),
                    });
                }
            }
        }
        Ok(())
    }

    async fn migrate_table(&self, table: &str) -> Result<TableCopy, MigrateError> {
        let schema = self.schema();
        let source_columns = self.source.columns(schema, table).await?;
        let target_columns = self.target.columns(schema, table).await?;
        let mapping = match_columns(table, &source_columns, &target_columns, self.config);
        if mapping.columns.is_empty() {
            return Err(MigrateError::table(table, "no columns in common"));
        }
        debug!(
            table,
            copied = mapping.columns.len(),
            skipped = mapping.skipped.len(),
            auto_defaults = mapping.auto_defaults.len(),
            "Matched columns"
        );

        if self.options.dry_run {
            let rows = self.source.row_count(schema, table).await?;
            info!(table, "would migrate {rows} rows");
            return Ok(TableCopy { rows, inserted: 0 });
        }

        let columns = mapping.target_columns();
        let batch_size = self.options.batch_size.max(1);
        let mut cursor = self
            .source
            .open_cursor(schema, table, &mapping.source_columns())
            .await?;

        let mut rows = 0_u64;
        let mut inserted = 0_u64;
        loop {
            let batch = cursor.next_batch(batch_size).await?;
            if batch.is_empty() {
                break;
            }
            let adapted: Vec<Row> = batch.iter().map(|row| adapt_row(row, &mapping)).collect();
            inserted += self.target.insert_rows(schema, table, &columns, &adapted).await?;
            rows += batch.len() as u64;
            debug!(table, rows, "Batch copied");
        }
        cursor.close().await?;

        info!(table, rows, inserted, "Table migrated");
        Ok(TableCopy { rows, inserted })
    }

    /// Compares row counts on both sides for every discovered table.
    ///
    /// The per-table lines and the verdict are logged as well as returned.
    ///
    /// # Errors
    ///
    /// Returns query errors from either side.
    pub async fn validate(&self) -> Result<ValidationReport, MigrateError> {
        let schema = self.schema();
        let mut report = ValidationReport::default();
        for table in self.discover().await? {
            let source = self.source.row_count(schema, &table).await?;
            let target = self.target.row_count(schema, &table).await?;
            report.tables.push(TableCount { table, source, target });
        }

        for line in report.lines() {
            info!("{line}");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::memory::MemoryDatabase;
    use crate::schema::ColumnInfo;

    fn member_columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", "uuid").not_null(),
            ColumnInfo::new("organization_id", "uuid"),
            ColumnInfo::new("name", "text"),
        ]
    }

    fn org_columns() -> Vec<ColumnInfo> {
        vec![ColumnInfo::new("id", "uuid").not_null(), ColumnInfo::new("name", "text")]
    }

    fn source() -> MemoryDatabase {
        let db = MemoryDatabase::new()
            .with_table("organizations", org_columns())
            .with_table("members", member_columns())
            .with_table("__drizzle_migrations", vec![ColumnInfo::new("id", "integer")]);
        db.seed("organizations", vec![json!({"id": "o1", "name": "Local 101"})]);
        db.seed(
            "members",
            (0..5)
                .map(|i| json!({"id": format!("m{i}"), "organization_id": "o1", "name": format!("Member {i}")}))
                .collect(),
        );
        db
    }

    fn target() -> MemoryDatabase {
        MemoryDatabase::new()
            .with_table("members", member_columns())
            .with_table("organizations", org_columns())
            .with_table("__drizzle_migrations", vec![ColumnInfo::new("id", "integer")])
            .with_table("django_migrations", vec![ColumnInfo::new("id", "integer")])
            .with_dependency("members", "organizations")
    }

    fn options(dir: &tempfile::TempDir) -> RunOptions {
        let mut options = RunOptions::new(Platform::Ue, &MigrateConfig::default());
        options.checkpoint_dir = Utf8PathBuf::from_path_buf(dir.path().join("ckpt")).unwrap();
        options.batch_size = 2;
        options
    }

    #[tokio::test]
    async fn test_discover_intersects_and_orders() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(&source, &target, &config, options(&dir));
        assert_eq!(migrator.discover().await.unwrap(), vec!["organizations", "members"]);
    }

    #[tokio::test]
    async fn test_run_copies_in_batches_and_checkpoints() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(&source, &target, &config, options(&dir));

        let summary = migrator.run().await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.total_rows, 6);
        assert_eq!(summary.tables[0].table, "organizations");
        assert_eq!(summary.table("members").map(|t| t.inserted), Some(5));
        assert_eq!(target.rows("members").len(), 5);
        assert!(target.triggers_enabled());

        let path = summary.checkpoint.unwrap();
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["completed_tables"], json!(["organizations", "members"]));
        assert_eq!(saved["row_counts"]["members"], 5);
        assert_eq!(saved["status"], "completed");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        Migrator::new(&source, &target, &config, options(&dir)).run().await.unwrap();
        let second = Migrator::new(&source, &target, &config, options(&dir)).run().await.unwrap();
        assert_eq!(second.table("members").map(|t| t.inserted), Some(0));
        assert_eq!(target.rows("members").len(), 5);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let source = MemoryDatabase::new().with_table("events", vec![ColumnInfo::new("id", "integer")]);
        source.seed("events", (0..10_000).map(|i| json!({"id": i})).collect());
        let target = MemoryDatabase::new().with_table("events", vec![ColumnInfo::new("id", "integer")]);
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.dry_run = true;
        opts.batch_size = 1000;

        let summary = Migrator::new(&source, &target, &config, opts.clone()).run().await.unwrap();
        let events = summary.table("events").unwrap();
        assert_eq!(events.status, TableStatus::DryRun);
        assert_eq!(events.rows, 10_000);
        assert!(target.rows("events").is_empty());
        assert!(target.touched_tables().is_empty());
        assert!(summary.checkpoint.is_none());
        assert!(!opts.checkpoint_path().exists());
    }

    #[tokio::test]
    async fn test_resume_skips_completed_tables() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let opts = options(&dir);

        let mut job = MigrationJob::open(&opts.checkpoint_path(), Platform::Ue, false).unwrap();
        job.plan(&["organizations".to_owned()]);
        job.complete("organizations", 1).unwrap();

        let mut resumed = opts.clone();
        resumed.resume = true;
        let summary = Migrator::new(&source, &target, &config, resumed).run().await.unwrap();

        assert_eq!(
            summary.table("organizations").map(|t| t.status),
            Some(TableStatus::AlreadyCompleted)
        );
        assert!(!source.touched_tables().contains(&"organizations".to_owned()));
        assert!(!target.touched_tables().contains(&"organizations".to_owned()));
        assert!(target.rows("organizations").is_empty());
        assert_eq!(target.rows("members").len(), 5);
        assert_eq!(summary.total_rows, 5);
    }

    #[tokio::test]
    async fn test_failed_table_does_not_stop_run() {
        let source = source();
        let target = target().failing_inserts("organizations");
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();

        let summary = Migrator::new(&source, &target, &config, options(&dir)).run().await.unwrap();
        assert_eq!(summary.status, RunStatus::CompletedWithErrors);
        let failed: Vec<_> = summary.failed().map(|t| t.table.as_str()).collect();
        assert_eq!(failed, vec!["organizations"]);
        assert_eq!(target.rows("members").len(), 5);

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(summary.checkpoint.unwrap()).unwrap()).unwrap();
        assert!(saved["failed_tables"]["organizations"]
            .as_str()
            .is_some_and(|e| e.contains("invalid input syntax")));
    }

    #[tokio::test]
    async fn test_table_filter() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.tables = Some(vec!["members".to_owned(), "ghosts".to_owned()]);

        let summary = Migrator::new(&source, &target, &config, opts).run().await.unwrap();
        assert_eq!(summary.tables.len(), 1);
        assert!(target.rows("organizations").is_empty());
    }

    #[tokio::test]
    async fn test_validate_reports_mismatch() {
        let (source, target) = (source(), target());
        let config = MigrateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(&source, &target, &config, options(&dir));

        let before = migrator.validate().await.unwrap();
        assert!(!before.all_green());
        assert_eq!(before.mismatches().count(), 2);

        migrator.run().await.unwrap();
        assert!(migrator.validate().await.unwrap().all_green());
    }
}
