//! Table descriptors: the parsed, dialect-independent view of one table.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::column::ColumnDescriptor;
use crate::naming::model_name_for_table;

/// Which schema dialect a table was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDialect {
    /// `CREATE TABLE` statements.
    Sql,
    /// Drizzle ORM `pgTable(...)` declarations.
    Drizzle,
}

impl SourceDialect {
    /// Returns the lowercase dialect tag.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Drizzle => "drizzle",
        }
    }
}

/// One parsed table.
///
/// A table with no columns is not valid and is discarded by the
/// normalization pass.
///
/// # Examples
///
/// ```
/// use ue_core::{ColumnDescriptor, FieldType, SourceDialect, TableDescriptor};
///
/// let mut table = TableDescriptor::new("grievances", "grievances", SourceDialect::Sql, "schema.sql");
/// assert_eq!(table.model_name, "Grievance");
/// assert!(!table.is_valid());
///
/// table.columns.push(ColumnDescriptor::new("title", "TEXT", FieldType::Text));
/// assert!(table.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name in the database.
    pub table_name: String,
    /// Generated model class name.
    pub model_name: String,
    /// Owning module (Django app) name.
    pub module: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Multi-column unique constraints, each a list of column names.
    pub unique_together: Vec<Vec<String>>,
    /// Dialect the table was parsed from.
    pub dialect: SourceDialect,
    /// File the table was declared in.
    pub source_path: Utf8PathBuf,
}

impl TableDescriptor {
    /// Creates an empty table, deriving the model name from the table name.
    #[must_use]
    pub fn new(
        table_name: impl Into<String>,
        module: impl Into<String>,
        dialect: SourceDialect,
        source_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        let table_name = table_name.into();
        Self {
            model_name: model_name_for_table(&table_name),
            table_name,
            module: module.into(),
            columns: Vec::new(),
            unique_together: Vec::new(),
            dialect,
            source_path: source_path.into(),
        }
    }

    /// Returns `true` if at least one column was parsed.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name for modification.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDescriptor> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Returns `true` if any column references another table.
    #[must_use]
    pub fn has_foreign_keys(&self) -> bool {
        self.columns.iter().any(|c| c.foreign_key.is_some())
    }

    /// Returns `true` if any column has an enumerated choice list.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        self.columns.iter().any(ColumnDescriptor::has_choices)
    }

    /// Returns `true` if any column stores JSON.
    #[must_use]
    pub fn has_json(&self) -> bool {
        self.columns.iter().any(|c| c.field_type.is_json())
    }

    /// Returns `true` if any column references `table`.
    #[must_use]
    pub fn references_table(&self, table: &str) -> bool {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref())
            .any(|fk| fk.table == table)
    }

    /// Columns that become ordinary model fields.
    ///
    /// Skips the source `id` (a surrogate is always synthesized), computed
    /// search-vector columns, and other database-generated columns.
    pub fn emittable_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !c.is_id() && !c.is_search_vector() && !c.generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldType, ForeignKeyRef};

    fn sample() -> TableDescriptor {
        let mut table = TableDescriptor::new("claims", "claims", SourceDialect::Drizzle, "claims.ts");
        table.columns.push(ColumnDescriptor::new("id", "uuid", FieldType::Uuid));
        let mut org = ColumnDescriptor::new("organization_id", "uuid", FieldType::Uuid);
        org.foreign_key = Some(ForeignKeyRef::new("organizations", "id"));
        table.columns.push(org);
        table
            .columns
            .push(ColumnDescriptor::new("search_vector", "tsvector", FieldType::SearchVector));
        table
    }

    #[test]
    fn test_references_table() {
        let table = sample();
        assert!(table.references_table("organizations"));
        assert!(!table.references_table("members"));
        assert!(table.has_foreign_keys());
        assert!(!table.has_json());
    }

    #[test]
    fn test_emittable_columns_skip_id_and_search_vector() {
        let table = sample();
        let names: Vec<_> = table.emittable_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["organization_id"]);
    }

    #[test]
    fn test_model_name_derived() {
        let table = TableDescriptor::new("member_statuses", "members", SourceDialect::Sql, "x.sql");
        assert_eq!(table.model_name, "MemberStatus");
    }
}
