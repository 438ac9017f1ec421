//! Row adaptation between the source and target shapes.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::database::Row;
use crate::matching::TableMapping;
use crate::schema::ColumnKind;

/// Timestamp columns filled with the current time when NULL.
pub const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at"];

/// A synthesized value for a target-only NOT NULL column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoDefault {
    /// `0`.
    Zero,
    /// `''`.
    EmptyString,
    /// `{}`.
    EmptyObject,
    /// A fresh UUID for every row.
    Uuid,
}

impl AutoDefault {
    /// The default for a value class, if it has one.
    #[must_use]
    pub const fn for_kind(kind: ColumnKind) -> Option<Self> {
        match kind {
            ColumnKind::Numeric => Some(Self::Zero),
            ColumnKind::Text => Some(Self::EmptyString),
            ColumnKind::Json => Some(Self::EmptyObject),
            ColumnKind::Uuid => Some(Self::Uuid),
            ColumnKind::Boolean
            | ColumnKind::Temporal
            | ColumnKind::Array
            | ColumnKind::Other => None,
        }
    }

    /// Produces the value. [`AutoDefault::Uuid`] yields a new UUID per call.
    #[must_use]
    pub fn value(self) -> Value {
        match self {
            Self::Zero => Value::from(0),
            Self::EmptyString => Value::String(String::new()),
            Self::EmptyObject => Value::Object(serde_json::Map::new()),
            Self::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Converts a source row into a target row.
///
/// - values are re-keyed from source to target column names
/// - text holding a JSON document becomes the document for JSON targets
/// - arrays pass through unchanged for native array targets
/// - objects and arrays bound for any other column are serialized to text
/// - NULL `created_at`/`updated_at` becomes the current time
/// - auto-default columns get a fresh value
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use ue_core::MigrateConfig;
/// use ue_migrator::{adapt_row, match_columns, ColumnInfo};
///
/// let source = [ColumnInfo::new("settings", "text"), ColumnInfo::new("created_at", "timestamp with time zone")];
/// let target = [ColumnInfo::new("settings", "jsonb"), ColumnInfo::new("created_at", "timestamp with time zone")];
/// let mapping = match_columns("orgs", &source, &target, &MigrateConfig::default());
///
/// let row = json!({"settings": "{\"theme\":\"dark\"}", "created_at": null});
/// let adapted = adapt_row(row.as_object().unwrap(), &mapping);
/// assert_eq!(adapted["settings"], json!({"theme": "dark"}));
/// assert!(adapted["created_at"].is_string());
/// ```
#[must_use]
pub fn adapt_row(row: &Row, mapping: &TableMapping) -> Row {
    let mut out = Row::new();

    for column in &mapping.columns {
        let value = row.get(&column.source).cloned().unwrap_or(Value::Null);
        out.insert(column.target.clone(), adapt_value(value, column.kind, &column.target));
    }
    for (name, default) in &mapping.auto_defaults {
        out.insert(name.clone(), default.value());
    }

    out
}

fn adapt_value(value: Value, kind: ColumnKind, target: &str) -> Value {
    match (value, kind) {
        (Value::Null, _) if TIMESTAMP_COLUMNS.contains(&target) => {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        (Value::String(text), ColumnKind::Json) => match serde_json::from_str::<Value>(&text) {
            Ok(doc @ (Value::Object(_) | Value::Array(_))) => doc,
            _ => Value::String(text),
        },
        (value @ (Value::Object(_) | Value::Array(_)), ColumnKind::Json | ColumnKind::Array) => value,
        (value @ (Value::Object(_) | Value::Array(_)), _) => Value::String(value.to_string()),
        (value, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use ue_core::MigrateConfig;

    use super::*;
    use crate::matching::match_columns;
    use crate::schema::ColumnInfo;

    fn mapping(pairs: &[(&str, &str)], extra_target: &[ColumnInfo]) -> TableMapping {
        let source: Vec<_> = pairs.iter().map(|(n, _)| ColumnInfo::new(*n, "text")).collect();
        let mut target: Vec<_> = pairs.iter().map(|(n, t)| ColumnInfo::new(*n, *t)).collect();
        target.extend_from_slice(extra_target);
        match_columns("t", &source, &target, &MigrateConfig::default())
    }

    #[test]
    fn test_arrays_pass_through() {
        let m = mapping(&[("tags", "ARRAY"), ("meta", "jsonb")], &[]);
        let row = json!({"tags": ["a", "b"], "meta": {"k": [1, 2]}});
        let out = adapt_row(row.as_object().unwrap(), &m);
        assert_eq!(out["tags"], json!(["a", "b"]));
        assert_eq!(out["meta"], json!({"k": [1, 2]}));
    }

    #[test]
    fn test_structured_value_into_text_is_serialized() {
        let m = mapping(&[("notes", "text")], &[]);
        let row = json!({"notes": {"a": 1}});
        let out = adapt_row(row.as_object().unwrap(), &m);
        assert_eq!(out["notes"], json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_plain_string_into_json_stays_string() {
        let m = mapping(&[("meta", "json")], &[]);
        let row = json!({"meta": "not json"});
        let out = adapt_row(row.as_object().unwrap(), &m);
        assert_eq!(out["meta"], json!("not json"));
    }

    #[test]
    fn test_null_timestamps_filled_other_nulls_kept() {
        let m = mapping(&[("updated_at", "timestamp without time zone"), ("closed_at", "timestamp without time zone")], &[]);
        let row = json!({"updated_at": null, "closed_at": null});
        let out = adapt_row(row.as_object().unwrap(), &m);
        assert!(out["updated_at"].as_str().is_some_and(|s| s.ends_with('Z')));
        assert!(out["closed_at"].is_null());
    }

    #[test]
    fn test_missing_source_key_becomes_null() {
        let m = mapping(&[("title", "text")], &[]);
        let out = adapt_row(&Row::new(), &m);
        assert!(out["title"].is_null());
    }

    #[test]
    fn test_uuid_default_is_fresh_per_row() {
        let m = mapping(&[("title", "text")], &[ColumnInfo::new("external_id", "uuid").not_null()]);
        let row = json!({"title": "x"});
        let first = adapt_row(row.as_object().unwrap(), &m);
        let second = adapt_row(row.as_object().unwrap(), &m);
        assert_ne!(first["external_id"], second["external_id"]);
        assert_eq!(m.target_columns(), vec!["title", "external_id"]);
    }

    #[test]
    fn test_auto_default_values() {
        assert_eq!(AutoDefault::Zero.value(), json!(0));
        assert_eq!(AutoDefault::EmptyString.value(), json!(""));
        assert_eq!(AutoDefault::EmptyObject.value(), json!({}));
        assert!(AutoDefault::for_kind(ColumnKind::Boolean).is_none());
    }
}
