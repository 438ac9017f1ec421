//! Postgres implementation of [`Database`] over sqlx.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::database::{Database, Row, RowCursor};
use crate::error::{MigrateError, Side};
use crate::schema::{ColumnInfo, ColumnKind, Dependency};

const CURSOR_NAME: &str = "ue_migrate_cursor";

/// Quotes an identifier for interpolation into SQL.
///
/// # Examples
///
/// ```
/// use ue_migrator::quote_ident;
///
/// assert_eq!(quote_ident("claims"), r#""claims""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A pooled Postgres connection.
#[derive(Debug)]
pub struct PgDatabase {
    pool: PgPool,
    side: Side,
    replica: AtomicBool,
}

impl PgDatabase {
    /// Connects, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Connect`] for a bad URL or refused connection
    /// and [`MigrateError::ConnectTimeout`] when the timeout elapses.
    pub async fn connect(url: &str, side: Side, timeout: Duration) -> Result<Self, MigrateError> {
        info!(side = %side, "Connecting to database");
        let connecting = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(timeout)
            .connect(url);

        let pool = tokio::time::timeout(timeout, connecting)
            .await
            .map_err(|_| MigrateError::ConnectTimeout {
                side,
                seconds: timeout.as_secs(),
            })?
            .map_err(|source| MigrateError::Connect { side, source })?;

        info!(side = %side, "Database connected");
        Ok(Self {
            pool,
            side,
            replica: AtomicBool::new(false),
        })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, side: Side) -> Self {
        Self {
            pool,
            side,
            replica: AtomicBool::new(false),
        }
    }

    /// Which side this connection serves.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }
}

/// A server-side cursor held open inside a read transaction.
pub struct PgCursor {
    tx: Transaction<'static, Postgres>,
    table: String,
}

impl std::fmt::Debug for PgCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCursor").field("table", &self.table).finish_non_exhaustive()
    }
}

#[async_trait]
impl RowCursor for PgCursor {
    async fn next_batch(&mut self, size: usize) -> Result<Vec<Row>, MigrateError> {
        let sql = format!("FETCH FORWARD {size} FROM {CURSOR_NAME}");
        let values: Vec<Value> = sqlx::query_scalar(&sql).fetch_all(&mut *self.tx).await?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(MigrateError::table(
                    self.table.as_str(),
                    format!("cursor returned a non-object row: {other}"),
                )),
            })
            .collect()
    }

    async fn close(mut self) -> Result<(), MigrateError> {
        sqlx::query(&format!("CLOSE {CURSOR_NAME}"))
            .execute(&mut *self.tx)
            .await?;
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Cursor = PgCursor;

    async fn tables(&self, schema: &str) -> Result<Vec<String>, MigrateError> {
        let tables = sqlx::query_scalar(
            r"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
            ",
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await?;
        Ok(tables)
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, MigrateError> {
        let rows: Vec<(String, String, bool, bool, bool)> = sqlx::query_as(
            r"
            SELECT column_name::text,
                   data_type::text,
                   is_nullable = 'YES',
                   column_default IS NOT NULL OR is_identity = 'YES',
                   is_generated = 'ALWAYS'
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            ",
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, nullable, has_default, generated)| ColumnInfo {
                kind: ColumnKind::from_data_type(&data_type),
                name,
                data_type,
                nullable,
                has_default,
                generated,
            })
            .collect())
    }

    async fn dependencies(&self, schema: &str) -> Result<Vec<Dependency>, MigrateError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT DISTINCT src.relname::text, ref.relname::text
            FROM pg_constraint c
            JOIN pg_class src ON src.oid = c.conrelid
            JOIN pg_class ref ON ref.oid = c.confrelid
            JOIN pg_namespace n ON n.oid = src.relnamespace
            WHERE c.contype = 'f' AND n.nspname = $1
            ",
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(table, references)| Dependency { table, references })
            .collect())
    }

    async fn row_count(&self, schema: &str, table: &str) -> Result<u64, MigrateError> {
        let sql = format!("SELECT count(*) FROM {}", qualified(schema, table));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn open_cursor(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<PgCursor, MigrateError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "DECLARE {CURSOR_NAME} NO SCROLL CURSOR FOR SELECT to_jsonb(t) FROM (SELECT {} FROM {}) t",
            column_list(columns),
            qualified(schema, table)
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
        debug!(table, columns = columns.len(), "Opened cursor");
        Ok(PgCursor {
            tx,
            table: table.to_owned(),
        })
    }

    async fn insert_rows(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, MigrateError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let target = qualified(schema, table);
        let list = column_list(columns);
        let sql = format!(
            "INSERT INTO {target} ({list}) SELECT {list} FROM jsonb_populate_recordset(NULL::{target}, $1) ON CONFLICT DO NOTHING"
        );
        let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());

        let mut tx = self.pool.begin().await?;
        if self.replica.load(Ordering::Relaxed) {
            sqlx::query("SET LOCAL session_replication_role = replica")
                .execute(&mut *tx)
                .await?;
        }
        let result = sqlx::query(&sql).bind(payload).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn set_triggers_enabled(&self, enabled: bool) -> Result<(), MigrateError> {
        self.replica.store(!enabled, Ordering::Relaxed);
        info!(side = %self.side, enabled, "Trigger enforcement for writes");
        Ok(())
    }
}
