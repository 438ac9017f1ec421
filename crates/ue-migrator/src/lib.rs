//! # ue-migrator
//!
//! Resumable Postgres-to-Postgres data migration from the legacy Union Eyes
//! databases into the Django schema.
//!
//! A run moves through these steps:
//!
//! 1. **Discover** the tables both databases hold, minus bookkeeping tables
//!    and configured exclusions ([`Migrator::discover`]).
//! 2. **Order** them so referenced tables load first ([`topological_order`]).
//! 3. **Match** source columns to target columns per table, applying skip
//!    lists, renames, and auto-defaults ([`match_columns`]).
//! 4. **Copy** rows in batches through a server-side cursor, adapting values
//!    on the way ([`adapt_row`]) and recording progress in a
//!    [`Checkpoint`] after every table.
//! 5. **Validate** row counts on both sides ([`Migrator::validate`]).
//!
//! Both sides sit behind the [`Database`] trait; [`PgDatabase`] is the live
//! implementation and [`MemoryDatabase`] backs tests and rehearsals.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use ue_core::MigrateConfig;
//! use ue_migrator::{ColumnInfo, MemoryDatabase, Migrator, Platform, RunOptions, RunStatus};
//!
//! let columns = || vec![ColumnInfo::new("id", "uuid").not_null(), ColumnInfo::new("title", "text")];
//! let source = MemoryDatabase::new().with_table("claims", columns());
//! source.seed("claims", vec![json!({"id": "c1", "title": "Unpaid overtime"})]);
//! let target = MemoryDatabase::new().with_table("claims", columns());
//!
//! let config = MigrateConfig::default();
//! let dir = tempfile::tempdir()?;
//! let mut options = RunOptions::new(Platform::Ue, &config);
//! options.checkpoint_dir = camino::Utf8PathBuf::try_from(dir.path().to_path_buf())?;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let summary = runtime.block_on(Migrator::new(&source, &target, &config, options).run())?;
//! assert_eq!(summary.status, RunStatus::Completed);
//! assert_eq!(target.rows("claims").len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod adapt;
mod checkpoint;
mod database;
mod error;
mod matching;
mod memory;
mod order;
mod platform;
mod postgres;
mod runner;
mod schema;
mod validate;

pub use adapt::{adapt_row, AutoDefault, TIMESTAMP_COLUMNS};
pub use checkpoint::{Checkpoint, MigrationJob, RunStatus, TableState};
pub use database::{Database, Row, RowCursor};
pub use error::{MigrateError, Side};
pub use matching::{match_columns, ColumnMatch, MatchRule, SkipReason, SkippedColumn, TableMapping};
pub use memory::{MemoryCursor, MemoryDatabase};
pub use order::topological_order;
pub use platform::{Platform, UnknownPlatform};
pub use postgres::{quote_ident, PgCursor, PgDatabase};
pub use runner::{Migrator, RunOptions, RunSummary, TableOutcome, TableStatus};
pub use schema::{ColumnInfo, ColumnKind, Dependency};
pub use validate::{TableCount, ValidationReport};
