//! An in-memory [`Database`] for tests and rehearsals.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use ue_core::FxHashSet;

use crate::database::{Database, Row, RowCursor};
use crate::error::MigrateError;
use crate::schema::{ColumnInfo, Dependency};

/// Conflict key used for `ON CONFLICT DO NOTHING` semantics.
const KEY_COLUMN: &str = "id";

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    dependencies: Vec<Dependency>,
    failing: FxHashSet<String>,
    touched: Vec<String>,
    triggers_enabled: bool,
}

/// A database held in memory.
///
/// Tables live in a single schema; the `schema` argument of every call is
/// ignored. Rows are deduplicated on `id` when inserted. Every table whose
/// rows are counted, read, or written is recorded in
/// [`touched_tables`](Self::touched_tables).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use ue_migrator::{ColumnInfo, MemoryDatabase};
///
/// let db = MemoryDatabase::new()
///     .with_table("claims", vec![ColumnInfo::new("id", "uuid"), ColumnInfo::new("title", "text")]);
/// db.seed("claims", vec![json!({"id": "c1", "title": "Overtime"})]);
/// assert_eq!(db.rows("claims").len(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                triggers_enabled: true,
                ..State::default()
            }),
        }
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(self, name: &str, columns: Vec<ColumnInfo>) -> Self {
        self.state.lock().tables.insert(
            name.to_owned(),
            MemoryTable {
                columns,
                rows: Vec::new(),
            },
        );
        self
    }

    /// Adds a foreign-key edge.
    #[must_use]
    pub fn with_dependency(self, table: &str, references: &str) -> Self {
        self.state
            .lock()
            .dependencies
            .push(Dependency::new(table, references));
        self
    }

    /// Makes every insert into `table` fail.
    #[must_use]
    pub fn failing_inserts(self, table: &str) -> Self {
        self.state.lock().failing.insert(table.to_owned());
        self
    }

    /// Appends rows directly, bypassing conflict handling. Non-object values
    /// are ignored.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.state.lock();
        if let Some(entry) = state.tables.get_mut(table) {
            entry.rows.extend(rows.into_iter().filter_map(|v| match v {
                Value::Object(row) => Some(row),
                _ => None,
            }));
        }
    }

    /// A copy of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Tables whose rows were counted, read, or written, in call order.
    #[must_use]
    pub fn touched_tables(&self) -> Vec<String> {
        self.state.lock().touched.clone()
    }

    /// Whether trigger enforcement is currently on.
    #[must_use]
    pub fn triggers_enabled(&self) -> bool {
        self.state.lock().triggers_enabled
    }

    fn touch(state: &mut State, table: &str) {
        state.touched.push(table.to_owned());
    }
}

/// A cursor over a snapshot of a table's rows.
#[derive(Debug)]
pub struct MemoryCursor {
    rows: std::vec::IntoIter<Row>,
}

#[async_trait]
impl RowCursor for MemoryCursor {
    async fn next_batch(&mut self, size: usize) -> Result<Vec<Row>, MigrateError> {
        Ok(self.rows.by_ref().take(size.max(1)).collect())
    }

    async fn close(self) -> Result<(), MigrateError> {
        Ok(())
    }
}

fn missing(table: &str) -> MigrateError {
    MigrateError::table(table, "relation does not exist")
}

#[async_trait]
impl Database for MemoryDatabase {
    type Cursor = MemoryCursor;

    async fn tables(&self, _schema: &str) -> Result<Vec<String>, MigrateError> {
        Ok(self.state.lock().tables.keys().cloned().collect())
    }

    async fn columns(&self, _schema: &str, table: &str) -> Result<Vec<ColumnInfo>, MigrateError> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| missing(table))
    }

    async fn dependencies(&self, _schema: &str) -> Result<Vec<Dependency>, MigrateError> {
        Ok(self.state.lock().dependencies.clone())
    }

    async fn row_count(&self, _schema: &str, table: &str) -> Result<u64, MigrateError> {
        let mut state = self.state.lock();
        Self::touch(&mut state, table);
        state
            .tables
            .get(table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| missing(table))
    }

    async fn open_cursor(
        &self,
        _schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<MemoryCursor, MigrateError> {
        let mut state = self.state.lock();
        Self::touch(&mut state, table);
        let entry = state.tables.get(table).ok_or_else(|| missing(table))?;
        let rows: Vec<Row> = entry
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        Ok(MemoryCursor {
            rows: rows.into_iter(),
        })
    }

    async fn insert_rows(
        &self,
        _schema: &str,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, MigrateError> {
        let mut state = self.state.lock();
        Self::touch(&mut state, table);
        if state.failing.contains(table) {
            return Err(MigrateError::table(table, "invalid input syntax for type integer"));
        }
        let entry = state.tables.get_mut(table).ok_or_else(|| missing(table))?;

        if let Some(unknown) = columns
            .iter()
            .find(|c| !entry.columns.iter().any(|col| &col.name == *c))
        {
            return Err(MigrateError::table(
                table,
                format!("column \"{unknown}\" does not exist"),
            ));
        }

        let mut inserted = 0;
        for row in rows {
            let key = row.get(KEY_COLUMN).filter(|v| !v.is_null());
            let conflict =
                key.is_some_and(|k| entry.rows.iter().any(|existing| existing.get(KEY_COLUMN) == Some(k)));
            if conflict {
                continue;
            }
            let stored: Row = columns
                .iter()
                .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                .collect();
            entry.rows.push(stored);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn set_triggers_enabled(&self, enabled: bool) -> Result<(), MigrateError> {
        self.state.lock().triggers_enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn db() -> MemoryDatabase {
        MemoryDatabase::new().with_table(
            "claims",
            vec![ColumnInfo::new("id", "text"), ColumnInfo::new("title", "text")],
        )
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_skips_conflicts() {
        let db = db();
        let columns = vec!["id".to_owned(), "title".to_owned()];
        let rows = vec![row(json!({"id": "1", "title": "a"})), row(json!({"id": "2", "title": "b"}))];
        assert_eq!(db.insert_rows("public", "claims", &columns, &rows).await.unwrap(), 2);
        assert_eq!(db.insert_rows("public", "claims", &columns, &rows).await.unwrap(), 0);
        assert_eq!(db.row_count("public", "claims").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_column() {
        let db = db();
        let err = db
            .insert_rows("public", "claims", &["status".to_owned()], &[Row::new()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "table claims: column \"status\" does not exist");
    }

    #[tokio::test]
    async fn test_cursor_batches() {
        let db = db();
        db.seed("claims", (0..5).map(|i| json!({"id": i.to_string(), "title": "t"})).collect());
        let mut cursor = db.open_cursor("public", "claims", &["id".to_owned()]).await.unwrap();
        assert_eq!(cursor.next_batch(2).await.unwrap().len(), 2);
        assert_eq!(cursor.next_batch(2).await.unwrap().len(), 2);
        let last = cursor.next_batch(2).await.unwrap();
        assert_eq!(last.len(), 1);
        assert!(last[0].get("title").is_none());
        assert!(cursor.next_batch(2).await.unwrap().is_empty());
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_table() {
        let err = db().columns("public", "ghosts").await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
