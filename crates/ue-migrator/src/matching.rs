//! Source to target column matching.

use serde::Serialize;
use tracing::{debug, warn};
use ue_core::reserved::keyword_rename;
use ue_core::{FxHashSet, MigrateConfig};

use crate::adapt::AutoDefault;
use crate::schema::{ColumnInfo, ColumnKind};

/// How a source column found its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Same name on both sides.
    Exact,
    /// A per-table or global rename.
    Renamed,
    /// The reserved-word `_field` convention.
    Keyword,
}

/// Why a source column is not copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Listed in a skip list.
    Configured,
    /// Computed in the source.
    Generated,
    /// No target column to receive it.
    NoTarget,
}

/// A source column copied into a target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    /// Source column name.
    pub source: String,
    /// Target column name.
    pub target: String,
    /// Target value class.
    pub kind: ColumnKind,
    /// Which rule matched.
    pub rule: MatchRule,
}

/// A source column that is not copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedColumn {
    /// Source column name.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// The column correspondence for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMapping {
    /// Table name.
    pub table: String,
    /// Copied columns in source order.
    pub columns: Vec<ColumnMatch>,
    /// Source columns left behind.
    pub skipped: Vec<SkippedColumn>,
    /// Target-only NOT NULL columns filled with a synthesized value.
    pub auto_defaults: Vec<(String, AutoDefault)>,
    /// Target-only NOT NULL columns with no known default; inserts will fail
    /// on them.
    pub unfilled: Vec<String>,
}

impl TableMapping {
    /// Source column names to read.
    #[must_use]
    pub fn source_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.source.clone()).collect()
    }

    /// Target column names written by each row, auto-defaults last.
    #[must_use]
    pub fn target_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.target.clone())
            .chain(self.auto_defaults.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Looks up the target of a source column.
    #[must_use]
    pub fn target_of(&self, source: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.source == source)
            .map(|c| c.target.as_str())
    }

    /// Returns `true` if `source` was skipped.
    #[must_use]
    pub fn is_skipped(&self, source: &str) -> bool {
        self.skipped.iter().any(|s| s.name == source)
    }
}

/// Matches source columns to target columns.
///
/// Each source column takes the first rule that applies:
///
/// 1. listed in the table's skip list or the global always-skip list: skipped
/// 2. generated in the source: skipped
/// 3. same-named, non-generated target column: copied
/// 4. per-table rename, then global rename, to an existing target column
/// 5. reserved-word rename (`not` to `not_field`) to an existing target column
/// 6. otherwise: skipped, the value is dropped
///
/// A target column receives at most one source column. Target columns left
/// unmatched that are NOT NULL without a server default get an
/// [`AutoDefault`] when their type has one.
///
/// # Examples
///
/// ```
/// use ue_core::MigrateConfig;
/// use ue_migrator::{match_columns, ColumnInfo};
///
/// let source = [ColumnInfo::new("id", "uuid"), ColumnInfo::new("not", "text"), ColumnInfo::new("legacy", "text")];
/// let target = [ColumnInfo::new("id", "uuid"), ColumnInfo::new("not_field", "text")];
///
/// let mapping = match_columns("notes", &source, &target, &MigrateConfig::default());
/// assert_eq!(mapping.target_of("id"), Some("id"));
/// assert_eq!(mapping.target_of("not"), Some("not_field"));
/// assert!(mapping.is_skipped("legacy"));
/// ```
#[must_use]
pub fn match_columns(
    table: &str,
    source: &[ColumnInfo],
    target: &[ColumnInfo],
    config: &MigrateConfig,
) -> TableMapping {
    let table_override = config.table_overrides.get(table);
    let available = |name: &str| target.iter().find(|c| c.name == name && !c.generated);

    let mut used: FxHashSet<&str> = FxHashSet::default();
    let mut columns = Vec::new();
    let mut skipped = Vec::new();

    for column in source {
        let name = column.name.as_str();
        let skip_listed = config.always_skip_columns.iter().any(|c| c == name)
            || table_override.is_some_and(|o| o.skip_columns.iter().any(|c| c == name));

        let reason = if skip_listed {
            Some(SkipReason::Configured)
        } else if column.generated {
            Some(SkipReason::Generated)
        } else {
            None
        };
        if let Some(reason) = reason {
            skipped.push(SkippedColumn {
                name: column.name.clone(),
                reason,
            });
            continue;
        }

        let renamed = table_override
            .and_then(|o| o.renames.get(name))
            .or_else(|| config.global_renames.get(name))
            .cloned();

        let candidates = [
            Some((name.to_owned(), MatchRule::Exact)),
            renamed.map(|r| (r, MatchRule::Renamed)),
            keyword_rename(name).map(|r| (r, MatchRule::Keyword)),
        ];
        let found = candidates.into_iter().flatten().find_map(|(candidate, rule)| {
            available(&candidate)
                .filter(|t| !used.contains(t.name.as_str()))
                .map(|t| (t, rule))
        });

        match found {
            Some((target_column, rule)) => {
                used.insert(target_column.name.as_str());
                columns.push(ColumnMatch {
                    source: column.name.clone(),
                    target: target_column.name.clone(),
                    kind: target_column.kind,
                    rule,
                });
            }
            None => {
                debug!(table, column = name, "No target column; value dropped");
                skipped.push(SkippedColumn {
                    name: column.name.clone(),
                    reason: SkipReason::NoTarget,
                });
            }
        }
    }

    let mut auto_defaults = Vec::new();
    let mut unfilled = Vec::new();
    for column in target {
        if used.contains(column.name.as_str()) || !column.requires_value() {
            continue;
        }
        match AutoDefault::for_kind(column.kind) {
            Some(default) => auto_defaults.push((column.name.clone(), default)),
            None => {
                warn!(
                    table,
                    column = %column.name,
                    data_type = %column.data_type,
                    "Target column is NOT NULL with no default and no source value"
                );
                unfilled.push(column.name.clone());
            }
        }
    }

    TableMapping {
        table: table.to_owned(),
        columns,
        skipped,
        auto_defaults,
        unfilled,
    }
}

#[cfg(test)]
mod tests {
    use ue_core::TableOverride;

    use super::*;

    fn col(name: &str, ty: &str) -> ColumnInfo {
        ColumnInfo::new(name, ty)
    }

    #[test]
    fn test_reserved_word_and_passthrough() {
        let source = [col("not", "text"), col("id", "uuid"), col("name", "text")];
        let target = [col("not_field", "text"), col("id", "uuid"), col("name", "text")];
        let mapping = match_columns("t", &source, &target, &MigrateConfig::default());

        assert_eq!(mapping.target_of("not"), Some("not_field"));
        assert_eq!(mapping.columns[0].rule, MatchRule::Keyword);
        assert_eq!(mapping.target_of("id"), Some("id"));
        assert_eq!(mapping.target_of("name"), Some("name"));
        assert!(mapping.skipped.is_empty());
    }

    #[test]
    fn test_source_only_column_is_skipped() {
        let source = [col("id", "uuid"), col("fax_number", "text")];
        let target = [col("id", "uuid")];
        let mapping = match_columns("members", &source, &target, &MigrateConfig::default());
        assert_eq!(
            mapping.skipped,
            vec![SkippedColumn {
                name: "fax_number".to_owned(),
                reason: SkipReason::NoTarget
            }]
        );
    }

    #[test]
    fn test_skip_lists_and_generated() {
        let mut config = MigrateConfig::default();
        config.table_overrides.insert(
            "claims".to_owned(),
            TableOverride {
                skip_columns: vec!["internal_notes".to_owned()],
                ..TableOverride::default()
            },
        );
        let source = [
            col("search_vector", "tsvector"),
            col("internal_notes", "text"),
            col("total", "numeric").generated(),
        ];
        let target = [col("search_vector", "tsvector"), col("internal_notes", "text"), col("total", "numeric")];
        let mapping = match_columns("claims", &source, &target, &config);

        assert!(mapping.columns.is_empty());
        let reasons: Vec<_> = mapping.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![SkipReason::Configured, SkipReason::Configured, SkipReason::Generated]
        );
    }

    #[test]
    fn test_global_and_table_renames() {
        let mut config = MigrateConfig::default();
        let mut renames = ue_core::FxHashMap::default();
        renames.insert("org_id".to_owned(), "organization_id".to_owned());
        config.table_overrides.insert(
            "members".to_owned(),
            TableOverride {
                renames,
                ..TableOverride::default()
            },
        );
        let source = [col("pk", "integer"), col("org_id", "uuid")];
        let target = [col("pk_field", "integer"), col("organization_id", "uuid")];
        let mapping = match_columns("members", &source, &target, &config);

        assert_eq!(mapping.target_of("pk"), Some("pk_field"));
        assert_eq!(mapping.target_of("org_id"), Some("organization_id"));
        assert!(mapping.columns.iter().all(|c| c.rule == MatchRule::Renamed));
    }

    #[test]
    fn test_generated_target_not_written() {
        let source = [col("full_name", "text")];
        let target = [col("full_name", "text").generated()];
        let mapping = match_columns("members", &source, &target, &MigrateConfig::default());
        assert!(mapping.is_skipped("full_name"));
    }

    #[test]
    fn test_auto_defaults_for_target_only_columns() {
        let source = [col("id", "uuid")];
        let target = [
            col("id", "uuid"),
            col("priority", "integer").not_null(),
            col("summary", "text").not_null(),
            col("metadata", "jsonb").not_null(),
            col("external_id", "uuid").not_null(),
            col("created_by", "uuid").not_null().with_default(),
            col("opened_on", "date").not_null(),
            col("notes", "text"),
        ];
        let mapping = match_columns("claims", &source, &target, &MigrateConfig::default());

        assert_eq!(
            mapping.auto_defaults,
            vec![
                ("priority".to_owned(), AutoDefault::Zero),
                ("summary".to_owned(), AutoDefault::EmptyString),
                ("metadata".to_owned(), AutoDefault::EmptyObject),
                ("external_id".to_owned(), AutoDefault::Uuid),
            ]
        );
        assert_eq!(mapping.unfilled, vec!["opened_on"]);
        assert_eq!(
            mapping.target_columns(),
            vec!["id", "priority", "summary", "metadata", "external_id"]
        );
    }
}
