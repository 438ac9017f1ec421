//! The database seam the migrator runs against.
//!
//! [`PgDatabase`](crate::PgDatabase) talks to Postgres;
//! [`MemoryDatabase`](crate::MemoryDatabase) backs tests and rehearsals.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::MigrateError;
use crate::schema::{ColumnInfo, Dependency};

/// One row, keyed by column name.
pub type Row = Map<String, Value>;

/// Reads rows of one table in batches.
#[async_trait]
pub trait RowCursor: Send {
    /// Returns up to `size` rows; an empty batch means the table is exhausted.
    async fn next_batch(&mut self, size: usize) -> Result<Vec<Row>, MigrateError>;

    /// Releases the cursor.
    async fn close(self) -> Result<(), MigrateError>;
}

/// Everything the migrator needs from a database.
#[async_trait]
pub trait Database: Send + Sync {
    /// The cursor type returned by [`open_cursor`](Self::open_cursor).
    type Cursor: RowCursor;

    /// Base table names in `schema`, sorted.
    async fn tables(&self, schema: &str) -> Result<Vec<String>, MigrateError>;

    /// Columns of `table` in ordinal order.
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, MigrateError>;

    /// Foreign-key edges between tables in `schema`.
    async fn dependencies(&self, schema: &str) -> Result<Vec<Dependency>, MigrateError>;

    /// Number of rows in `table`.
    async fn row_count(&self, schema: &str, table: &str) -> Result<u64, MigrateError>;

    /// Opens a cursor over `columns` of `table`.
    async fn open_cursor(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Self::Cursor, MigrateError>;

    /// Inserts `rows` into `columns` of `table` as one committed batch.
    ///
    /// Rows that conflict with an existing key are skipped. Returns the
    /// number of rows actually inserted.
    async fn insert_rows(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, MigrateError>;

    /// Suspends or restores trigger and foreign-key enforcement for writes.
    async fn set_triggers_enabled(&self, enabled: bool) -> Result<(), MigrateError>;
}
