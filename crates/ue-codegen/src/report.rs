//! The generation report: a JSON summary for human review.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::Serialize;
use ue_core::TableDescriptor;
use ue_schema::{DiagnosticKind, ParsedSchema};

use crate::emitter::{group_by_module, Emitter};
use crate::error::CodegenError;

/// Per-table summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name.
    pub table: String,
    /// Generated model class.
    pub model: String,
    /// Source dialect tag.
    pub dialect: &'static str,
    /// Emitted fields, excluding the synthesized `id` and the inherited tenant key.
    pub field_count: usize,
    /// Whether any column references another table.
    pub has_foreign_keys: bool,
    /// Whether any column has a choice list.
    pub has_choices: bool,
    /// Whether any column stores JSON.
    pub has_json: bool,
}

impl TableReport {
    fn new(table: &TableDescriptor, emitter: &Emitter<'_>) -> Self {
        Self {
            table: table.table_name.clone(),
            model: table.model_name.clone(),
            dialect: table.dialect.as_str(),
            field_count: emitter.model_columns(table).len(),
            has_foreign_keys: table.has_foreign_keys(),
            has_choices: table.has_choices(),
            has_json: table.has_json(),
        }
    }
}

/// Per-module summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    /// Module (Django app) name.
    pub module: String,
    /// Number of tables in the module.
    pub table_count: usize,
    /// Model class names in declaration order.
    pub models: Vec<String>,
    /// Table summaries.
    pub tables: Vec<TableReport>,
}

/// Summary of one generation run.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use ue_codegen::{Emitter, GenerationReport, ModelRegistry};
/// use ue_core::CodegenConfig;
/// use ue_schema::parse_sql;
///
/// let parsed = parse_sql(
///     "CREATE TABLE dues (id UUID PRIMARY KEY, member_id UUID REFERENCES members(id), meta JSONB);",
///     Utf8Path::new("billing.sql"),
/// );
/// let config = CodegenConfig::default();
/// let registry = ModelRegistry::from_tables(&parsed.tables);
/// let report = GenerationReport::build(&parsed, &Emitter::new(&config, &registry));
///
/// assert_eq!(report.total_tables, 1);
/// assert_eq!(report.modules[0].tables[0].field_count, 2);
/// assert!(report.modules[0].tables[0].has_json);
/// assert_eq!(report.unresolved_references, vec!["dues.member_id -> members"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Total number of generated models.
    pub total_tables: usize,
    /// Module summaries ordered by module name.
    pub modules: Vec<ModuleReport>,
    /// Diagnostic counts by kind; kinds that never occurred are omitted.
    pub diagnostics: BTreeMap<&'static str, usize>,
    /// Foreign keys whose target table was never parsed, as
    /// `table.column -> target`.
    pub unresolved_references: Vec<String>,
}

impl GenerationReport {
    /// Builds the report for a parsed schema.
    ///
    /// Field counts and unresolved references follow what `emitter` renders.
    #[must_use]
    pub fn build(schema: &ParsedSchema, emitter: &Emitter<'_>) -> Self {
        let registry = emitter.registry();
        let modules = group_by_module(&schema.tables)
            .into_iter()
            .map(|(module, tables)| ModuleReport {
                module: module.to_owned(),
                table_count: tables.len(),
                models: tables.iter().map(|t| t.model_name.clone()).collect(),
                tables: tables.iter().map(|t| TableReport::new(t, emitter)).collect(),
            })
            .collect();

        let mut diagnostics = BTreeMap::new();
        for kind in [
            DiagnosticKind::UnknownType,
            DiagnosticKind::SkippedFragment,
            DiagnosticKind::InferredReference,
            DiagnosticKind::DroppedTable,
        ] {
            let count = schema.count(kind);
            if count > 0 {
                diagnostics.insert(kind.as_str(), count);
            }
        }

        let unresolved_references = schema
            .tables
            .iter()
            .flat_map(|table| {
                emitter
                    .model_columns(table)
                    .into_iter()
                    .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c, fk)))
                    .filter(move |(_, fk)| registry.get(&fk.table).is_none())
                    .map(move |(c, fk)| format!("{}.{} -> {}", table.table_name, c.name, fk.table))
            })
            .collect();

        Self {
            total_tables: schema.tables.len(),
            modules,
            diagnostics,
            unresolved_references,
        }
    }

    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Report`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CodegenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the report to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Write`] if the file cannot be written.
    pub fn write(&self, path: &Utf8Path) -> Result<(), CodegenError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CodegenError::write(parent, e))?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| CodegenError::write(path, e))
    }
}
