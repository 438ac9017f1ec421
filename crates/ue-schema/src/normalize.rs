//! Post-parse normalization shared by both dialects.

use ue_core::{FxHashSet, TableDescriptor};

use crate::diagnostics::{record, Diagnostic, DiagnosticKind, ParsedSchema};

/// Applies the cross-dialect rules to parsed tables.
///
/// - A primary key on any column other than `id` is demoted to a unique,
///   non-null column, since generated models always get a surrogate `id`.
/// - Tables without columns are dropped.
/// - When two files declare the same table, the first declaration wins.
///
/// Every dropped table is recorded as a [`DiagnosticKind::DroppedTable`].
///
/// # Examples
///
/// ```
/// use ue_core::{ColumnDescriptor, FieldType, SourceDialect, TableDescriptor};
/// use ue_schema::finalize_tables;
///
/// let mut codes = TableDescriptor::new("codes", "core", SourceDialect::Sql, "a.sql");
/// let mut code = ColumnDescriptor::new("code", "TEXT", FieldType::Text);
/// code.primary_key = true;
/// codes.columns.push(code);
/// let empty = TableDescriptor::new("empty", "core", SourceDialect::Sql, "a.sql");
///
/// let mut diagnostics = Vec::new();
/// let tables = finalize_tables(vec![codes, empty], &mut diagnostics);
///
/// assert_eq!(tables.len(), 1);
/// assert!(tables[0].columns[0].unique);
/// assert!(!tables[0].columns[0].primary_key);
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[must_use]
pub fn finalize_tables(
    tables: Vec<TableDescriptor>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<TableDescriptor> {
    let mut seen = FxHashSet::default();
    let mut kept = Vec::with_capacity(tables.len());

    for mut table in tables {
        if !table.is_valid() {
            record(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::DroppedTable,
                    table.source_path.clone(),
                    Some(&table.table_name),
                    "table has no parseable columns",
                ),
            );
            continue;
        }
        if !seen.insert(table.table_name.clone()) {
            record(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::DroppedTable,
                    table.source_path.clone(),
                    Some(&table.table_name),
                    "table already declared in an earlier file",
                ),
            );
            continue;
        }

        for column in table.columns.iter_mut().filter(|c| !c.is_id()) {
            column.demote_primary_key();
        }
        kept.push(table);
    }

    kept
}

impl ParsedSchema {
    /// Runs [`finalize_tables`] over the parsed tables.
    #[must_use]
    pub fn finalize(mut self) -> Self {
        let tables = std::mem::take(&mut self.tables);
        self.tables = finalize_tables(tables, &mut self.diagnostics);
        self
    }
}

#[cfg(test)]
mod tests {
    use ue_core::{ColumnDescriptor, FieldType, SourceDialect};

    use super::*;

    fn table(name: &str, path: &str, columns: &[&str]) -> TableDescriptor {
        let mut table = TableDescriptor::new(name, "core", SourceDialect::Sql, path);
        for column in columns {
            let mut col = ColumnDescriptor::new(*column, "uuid", FieldType::Uuid);
            col.primary_key = true;
            table.columns.push(col);
        }
        table
    }

    #[test]
    fn test_id_primary_key_is_kept() {
        let mut diagnostics = Vec::new();
        let tables = finalize_tables(vec![table("members", "a.sql", &["id"])], &mut diagnostics);
        assert!(tables[0].columns[0].primary_key);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let mut diagnostics = Vec::new();
        let tables = finalize_tables(
            vec![table("members", "a.sql", &["id"]), table("members", "b.sql", &["id", "x"])],
            &mut diagnostics,
        );
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].source_path, "a.sql");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DroppedTable);
        assert_eq!(diagnostics[0].path, "b.sql");
    }

    #[test]
    fn test_parsed_schema_finalize() {
        let schema = ParsedSchema {
            tables: vec![table("empty", "a.sql", &[]), table("codes", "a.sql", &["code"])],
            diagnostics: Vec::new(),
        }
        .finalize();
        assert_eq!(schema.tables.len(), 1);
        assert!(schema.tables[0].columns[0].unique);
        assert_eq!(schema.count(DiagnosticKind::DroppedTable), 1);
    }
}
