//! Column descriptors produced by the schema parsers.
//!
//! A [`ColumnDescriptor`] is dialect independent: the SQL and Drizzle parsers
//! both resolve their source type into a [`FieldType`] tag and record the
//! constraints they found.

use serde::{Deserialize, Serialize};

/// The normalized target type of a column.
///
/// Every source type system maps onto this set. Types the mappers do not
/// recognize fall back to [`FieldType::Text`].
///
/// # Examples
///
/// ```
/// use ue_core::FieldType;
///
/// assert!(FieldType::Char { max_length: 50 }.is_textual());
/// assert!(FieldType::Json.is_json());
/// assert!(!FieldType::Integer.is_textual());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FieldType {
    /// Bounded string.
    Char {
        /// Maximum length in characters.
        max_length: u32,
    },
    /// Unbounded string.
    Text,
    /// 16-bit integer.
    SmallInteger,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Fixed-point number.
    Decimal {
        /// Total number of digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Floating-point number.
    Float,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp (with or without time zone).
    DateTime,
    /// Time of day.
    Time,
    /// Interval.
    Duration,
    /// UUID.
    Uuid,
    /// JSON or JSONB document.
    Json,
    /// Raw bytes.
    Binary,
    /// IP address.
    Inet,
    /// Computed full-text search vector.
    SearchVector,
}

impl FieldType {
    /// Returns `true` for [`Char`](Self::Char) and [`Text`](Self::Text).
    #[inline]
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Char { .. } | Self::Text)
    }

    /// Returns `true` for [`Json`](Self::Json).
    #[inline]
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns `true` for integer, decimal, and float types.
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::SmallInteger
                | Self::Integer
                | Self::BigInteger
                | Self::Decimal { .. }
                | Self::Float
        )
    }

    /// Returns a short lowercase label for reports and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Char { .. } => "char",
            Self::Text => "text",
            Self::SmallInteger => "small_integer",
            Self::Integer => "integer",
            Self::BigInteger => "big_integer",
            Self::Decimal { .. } => "decimal",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Binary => "binary",
            Self::Inet => "inet",
            Self::SearchVector => "search_vector",
        }
    }
}

/// Referential action taken when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Delete referencing rows.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// Set the referencing column to its default.
    SetDefault,
    /// Refuse the delete.
    Restrict,
    /// Defer the check; no action is taken by the column itself.
    NoAction,
}

impl OnDelete {
    /// Parses an action as written in SQL (`SET NULL`) or Drizzle (`'set null'`, `setNull`).
    ///
    /// Case, spaces, underscores, and quotes are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_core::OnDelete;
    ///
    /// assert_eq!(OnDelete::parse("SET NULL"), Some(OnDelete::SetNull));
    /// assert_eq!(OnDelete::parse("'cascade'"), Some(OnDelete::Cascade));
    /// assert_eq!(OnDelete::parse("explode"), None);
    /// ```
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        let normalized: String = action
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "cascade" => Some(Self::Cascade),
            "setnull" => Some(Self::SetNull),
            "setdefault" => Some(Self::SetDefault),
            "restrict" => Some(Self::Restrict),
            "noaction" => Some(Self::NoAction),
            _ => None,
        }
    }
}

/// A single-column foreign-key reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub column: String,
    /// Declared delete action, if any.
    pub on_delete: Option<OnDelete>,
    /// `true` when the table name was guessed from a variable name rather than
    /// resolved against a declared table.
    #[serde(default)]
    pub inferred: bool,
}

impl ForeignKeyRef {
    /// Creates a resolved reference with no declared delete action.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: None,
            inferred: false,
        }
    }

    /// Sets the delete action.
    #[must_use]
    pub const fn with_on_delete(mut self, on_delete: Option<OnDelete>) -> Self {
        self.on_delete = on_delete;
        self
    }
}

/// One parsed column.
///
/// Built once by a parser and owned by its
/// [`TableDescriptor`](crate::TableDescriptor). The only later change is
/// [`demote_primary_key`](Self::demote_primary_key), applied by the
/// normalization pass to primary keys not named `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as declared in the database.
    pub name: String,
    /// Source type string exactly as written (`NUMERIC(10,2)`, `varchar`).
    pub source_type: String,
    /// Resolved target type.
    pub field_type: FieldType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the column is declared as the primary key.
    pub primary_key: bool,
    /// Whether the column carries a single-column unique constraint.
    pub unique: bool,
    /// Default expression as written in the source (`'open'`, `now()`).
    pub default: Option<String>,
    /// Enumerated values from a CHECK constraint or enum type, order preserved.
    pub choices: Option<Vec<String>>,
    /// Foreign-key reference, if any.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Whether the column is an array of [`field_type`](Self::field_type).
    pub is_array: bool,
    /// Whether the column is computed (`GENERATED ALWAYS AS (...)`).
    pub generated: bool,
}

impl ColumnDescriptor {
    /// Creates a nullable, unconstrained column.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_core::{ColumnDescriptor, FieldType};
    ///
    /// let col = ColumnDescriptor::new("title", "TEXT", FieldType::Text);
    /// assert!(col.nullable);
    /// assert!(!col.primary_key);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, source_type: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            field_type,
            nullable: true,
            primary_key: false,
            unique: false,
            default: None,
            choices: None,
            foreign_key: None,
            is_array: false,
            generated: false,
        }
    }

    /// Returns `true` for the surrogate key column name.
    #[inline]
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.name == "id"
    }

    /// Returns `true` for a computed full-text search vector column.
    ///
    /// These columns are excluded from normal model emission.
    #[inline]
    #[must_use]
    pub fn is_search_vector(&self) -> bool {
        matches!(self.field_type, FieldType::SearchVector)
    }

    /// Returns `true` if the column has an enumerated choice list.
    #[inline]
    #[must_use]
    pub fn has_choices(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Turns a primary key into a unique, non-null column.
    ///
    /// Generated models always use a surrogate UUID `id`, so a natural key
    /// keeps its uniqueness without being the primary key.
    pub fn demote_primary_key(&mut self) {
        if self.primary_key {
            self.primary_key = false;
            self.unique = true;
            self.nullable = false;
        }
    }

    /// Returns the length of the longest choice value, if any choices exist.
    #[must_use]
    pub fn longest_choice(&self) -> Option<usize> {
        self.choices
            .as_ref()
            .and_then(|c| c.iter().map(|v| v.chars().count()).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demote_primary_key() {
        let mut col = ColumnDescriptor::new("code", "VARCHAR(10)", FieldType::Char { max_length: 10 });
        col.primary_key = true;
        col.demote_primary_key();
        assert!(!col.primary_key);
        assert!(col.unique);
        assert!(!col.nullable);
    }

    #[test]
    fn test_demote_is_noop_for_plain_columns() {
        let mut col = ColumnDescriptor::new("name", "TEXT", FieldType::Text);
        col.demote_primary_key();
        assert!(!col.unique);
        assert!(col.nullable);
    }

    #[test]
    fn test_longest_choice() {
        let mut col = ColumnDescriptor::new("status", "TEXT", FieldType::Text);
        assert_eq!(col.longest_choice(), None);
        col.choices = Some(vec!["open".to_owned(), "in_progress".to_owned()]);
        assert_eq!(col.longest_choice(), Some(11));
        assert!(col.has_choices());
    }

    #[test]
    fn test_on_delete_parse_variants() {
        assert_eq!(OnDelete::parse("no action"), Some(OnDelete::NoAction));
        assert_eq!(OnDelete::parse("setDefault"), Some(OnDelete::SetDefault));
        assert_eq!(OnDelete::parse("RESTRICT"), Some(OnDelete::Restrict));
    }

    #[test]
    fn test_field_type_serialization() {
        let json = serde_json::to_string(&FieldType::Char { max_length: 20 }).unwrap();
        assert_eq!(json, r#"{"kind":"char","max_length":20}"#);
        let json = serde_json::to_string(&FieldType::Uuid).unwrap();
        assert_eq!(json, r#"{"kind":"uuid"}"#);
    }
}
