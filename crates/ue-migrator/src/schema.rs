//! Introspected table and column metadata.

use serde::{Deserialize, Serialize};

/// A value class that drives row adaptation and auto-defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer, decimal, or floating-point.
    Numeric,
    /// Character types.
    Text,
    /// Boolean.
    Boolean,
    /// `json` or `jsonb`.
    Json,
    /// UUID.
    Uuid,
    /// Date, time, or timestamp.
    Temporal,
    /// A native Postgres array.
    Array,
    /// Anything else (bytea, inet, user-defined types).
    Other,
}

impl ColumnKind {
    /// Classifies an `information_schema.columns.data_type` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_migrator::ColumnKind;
    ///
    /// assert_eq!(ColumnKind::from_data_type("character varying"), ColumnKind::Text);
    /// assert_eq!(ColumnKind::from_data_type("jsonb"), ColumnKind::Json);
    /// assert_eq!(ColumnKind::from_data_type("ARRAY"), ColumnKind::Array);
    /// assert_eq!(ColumnKind::from_data_type("timestamp with time zone"), ColumnKind::Temporal);
    /// ```
    #[must_use]
    pub fn from_data_type(data_type: &str) -> Self {
        let lower = data_type.trim().to_ascii_lowercase();
        match lower.as_str() {
            "smallint" | "integer" | "bigint" | "numeric" | "decimal" | "real"
            | "double precision" | "money" => Self::Numeric,
            "text" | "character varying" | "character" | "varchar" | "char" | "citext" => {
                Self::Text
            }
            "boolean" => Self::Boolean,
            "json" | "jsonb" => Self::Json,
            "uuid" => Self::Uuid,
            "array" => Self::Array,
            other if other.starts_with("timestamp")
                || other.starts_with("time")
                || other == "date"
                || other == "interval" =>
            {
                Self::Temporal
            }
            _ => Self::Other,
        }
    }
}

/// One introspected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// `information_schema` data type.
    pub data_type: String,
    /// Value class derived from the data type.
    pub kind: ColumnKind,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the server fills the column when omitted (default or identity).
    pub has_default: bool,
    /// Whether the column is computed (`GENERATED ALWAYS AS`).
    pub generated: bool,
}

impl ColumnInfo {
    /// Creates a nullable, non-generated column without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            kind: ColumnKind::from_data_type(&data_type),
            data_type,
            nullable: true,
            has_default: false,
            generated: false,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as having a server default.
    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Marks the column as generated.
    #[must_use]
    pub const fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Returns `true` if an INSERT that omits this column would fail.
    #[must_use]
    pub const fn requires_value(&self) -> bool {
        !self.nullable && !self.has_default && !self.generated
    }
}

/// A foreign-key edge: `table` depends on `references`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// The referencing table.
    pub table: String,
    /// The referenced table.
    pub references: String,
}

impl Dependency {
    /// Creates an edge.
    #[must_use]
    pub fn new(table: impl Into<String>, references: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            references: references.into(),
        }
    }
}
