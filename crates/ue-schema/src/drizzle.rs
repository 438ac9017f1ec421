//! Drizzle schema lowering.
//!
//! Turns the syntax extracted by `ue-ts-parser` into [`TableDescriptor`]s.
//! Enum declarations and table variables from every file form shared
//! registries, so a table may reference an enum or table declared in another
//! file of the same batch.

use camino::{Utf8Path, Utf8PathBuf};
use ue_core::naming::to_snake_case;
use ue_core::{
    CodegenConfig, ColumnDescriptor, FieldType, ForeignKeyRef, FxHashMap, OnDelete, SourceDialect,
    TableDescriptor,
};
use ue_ts_parser::{
    ArgValue, ChainCall, ConstraintKind, DrizzleModule, EnumDecl, FieldDecl, Grammar, ParseError,
    TableDecl, TsParser,
};

use crate::diagnostics::{record, Diagnostic, DiagnosticKind, ParsedSchema};
use crate::error::SchemaError;
use crate::module::module_for_path;
use crate::typemap::map_drizzle_builder;

/// Default expression recorded for `.defaultNow()`.
pub const NOW_DEFAULT: &str = "now()";

/// Default expression recorded for `.defaultRandom()`.
pub const RANDOM_UUID_DEFAULT: &str = "gen_random_uuid()";

/// Drizzle schema parser bound to a code generation configuration.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use ue_core::CodegenConfig;
/// use ue_schema::DrizzleSchema;
///
/// let config = CodegenConfig::default();
/// let sources = vec![(
///     Utf8PathBuf::from("members-schema.ts"),
///     "export const members = pgTable('members', { id: uuid('id').primaryKey(), name: text('name').notNull() });"
///         .to_owned(),
/// )];
///
/// let parsed = DrizzleSchema::new(&config).parse_sources(&sources)?;
/// assert_eq!(parsed.tables[0].module, "members");
/// assert!(!parsed.tables[0].columns[1].nullable);
/// # Ok::<(), ue_schema::SchemaError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DrizzleSchema<'a> {
    config: &'a CodegenConfig,
}

/// Declarations shared across all files of one batch.
struct Registry<'m> {
    enums: FxHashMap<&'m str, &'m EnumDecl>,
    tables: FxHashMap<&'m str, &'m TableDecl>,
}

impl<'m> Registry<'m> {
    fn build(modules: &'m [(Utf8PathBuf, DrizzleModule)]) -> Self {
        let mut enums = FxHashMap::default();
        let mut tables = FxHashMap::default();
        for (_, module) in modules {
            for decl in &module.enums {
                enums.entry(decl.variable.as_str()).or_insert(decl);
            }
            for decl in &module.tables {
                tables.entry(decl.variable.as_str()).or_insert(decl);
            }
        }
        Self { enums, tables }
    }
}

impl<'a> DrizzleSchema<'a> {
    /// Creates a parser.
    #[must_use]
    pub const fn new(config: &'a CodegenConfig) -> Self {
        Self { config }
    }

    /// Parses a batch of Drizzle source files.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parser`] if a TypeScript grammar cannot be
    /// loaded. A file tree-sitter cannot parse is recorded as a diagnostic.
    pub fn parse_sources(&self, sources: &[(Utf8PathBuf, String)]) -> Result<ParsedSchema, SchemaError> {
        let mut diagnostics = Vec::new();
        let mut modules = Vec::with_capacity(sources.len());
        let mut ts = TsParser::new()?;
        let mut tsx = TsParser::new_tsx()?;

        for (path, text) in sources {
            let parser = match Grammar::for_path(path) {
                Grammar::TypeScript => &mut ts,
                Grammar::Tsx => &mut tsx,
            };
            match parser.drizzle(text) {
                Ok(module) => modules.push((path.clone(), module)),
                Err(ParseError::Parse) => record(
                    &mut diagnostics,
                    Diagnostic::new(
                        DiagnosticKind::SkippedFragment,
                        path.as_path(),
                        None,
                        "tree-sitter produced no syntax tree",
                    ),
                ),
                Err(err) => return Err(err.into()),
            }
        }

        let registry = Registry::build(&modules);
        let mut tables = Vec::new();
        for (path, module) in &modules {
            let module_name = module_for_path(path, &self.config.module_overrides);
            for decl in &module.tables {
                let mut lowering = TableLowering {
                    config: self.config,
                    registry: &registry,
                    path,
                    table: &decl.name,
                    diagnostics: &mut diagnostics,
                };
                tables.push(lowering.lower(decl, &module_name));
            }
        }

        Ok(ParsedSchema { tables, diagnostics })
    }
}

/// Lowering context for one table.
struct TableLowering<'r, 'm> {
    config: &'r CodegenConfig,
    registry: &'r Registry<'m>,
    path: &'r Utf8Path,
    table: &'r str,
    diagnostics: &'r mut Vec<Diagnostic>,
}

impl TableLowering<'_, '_> {
    fn diagnose(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        record(
            self.diagnostics,
            Diagnostic::new(kind, self.path, Some(self.table), message),
        );
    }

    fn lower(&mut self, decl: &TableDecl, module: &str) -> TableDescriptor {
        let mut table = TableDescriptor::new(&decl.name, module, SourceDialect::Drizzle, self.path);
        let mut key_to_column: FxHashMap<&str, String> = FxHashMap::default();

        for field in &decl.fields {
            let column = self.lower_field(field);
            key_to_column.insert(field.key.as_str(), column.name.clone());
            table.columns.push(column);
        }

        for entry in &decl.skipped {
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                format!("field entry `{}` at line {} is not a column builder", entry.text, entry.line),
            );
        }

        for constraint in &decl.constraints {
            let columns: Vec<String> = constraint
                .fields
                .iter()
                .filter_map(|key| key_to_column.get(key.as_str()).cloned())
                .collect();
            if columns.is_empty() || columns.len() != constraint.fields.len() {
                self.diagnose(
                    DiagnosticKind::SkippedFragment,
                    format!("constraint over unknown fields ({})", constraint.fields.join(", ")),
                );
                continue;
            }

            match (constraint.kind, columns.as_slice()) {
                (ConstraintKind::Unique, [single]) => {
                    if let Some(col) = table.column_mut(single) {
                        col.unique = true;
                    }
                }
                (ConstraintKind::PrimaryKey, [single]) => {
                    if let Some(col) = table.column_mut(single) {
                        col.primary_key = true;
                        col.nullable = false;
                    }
                }
                (kind, _) => {
                    if kind == ConstraintKind::PrimaryKey {
                        for name in &columns {
                            if let Some(col) = table.column_mut(name) {
                                col.nullable = false;
                            }
                        }
                    }
                    if !table.unique_together.contains(&columns) {
                        table.unique_together.push(columns);
                    }
                }
            }
        }

        table
    }

    fn lower_field(&mut self, field: &FieldDecl) -> ColumnDescriptor {
        let name = field
            .column_name()
            .map_or_else(|| to_snake_case(&field.key), str::to_owned);
        let options = field.options();
        let option_u32 = |key: &str| options.and_then(|o| o.get(key)).and_then(ArgValue::as_u32);

        let mut column = if let Some(decl) = self.registry.enums.get(field.builder.as_str()) {
            let mut column = ColumnDescriptor::new(&name, &decl.name, FieldType::Text);
            set_choices(&mut column, decl.values.clone());
            column
        } else {
            let field_type = map_drizzle_builder(
                &field.builder,
                option_u32("length"),
                option_u32("precision"),
                option_u32("scale"),
                self.config,
            );
            let field_type = field_type.unwrap_or_else(|| {
                self.diagnose(
                    DiagnosticKind::UnknownType,
                    format!("column {name}: unknown builder {}, using text", field.builder),
                );
                FieldType::Text
            });
            let mut column = ColumnDescriptor::new(&name, &field.builder, field_type);
            if let Some(values) = options.and_then(|o| o.get("enum")).and_then(ArgValue::string_items) {
                set_choices(&mut column, values);
            }
            column
        };

        for call in &field.chain {
            self.apply_call(&mut column, call);
        }

        column
    }

    fn apply_call(&mut self, column: &mut ColumnDescriptor, call: &ChainCall) {
        match call.method.as_str() {
            "primaryKey" => {
                column.primary_key = true;
                column.nullable = false;
            }
            "notNull" => column.nullable = false,
            "unique" => column.unique = true,
            "array" => column.is_array = true,
            "defaultNow" => column.default = Some(NOW_DEFAULT.to_owned()),
            "defaultRandom" => column.default = Some(RANDOM_UUID_DEFAULT.to_owned()),
            "default" => match call.args.first().and_then(default_literal) {
                Some(literal) => column.default = Some(literal),
                None => self.diagnose(
                    DiagnosticKind::SkippedFragment,
                    format!("column {}: default is not a literal", column.name),
                ),
            },
            "$defaultFn" | "$default" => {
                column.default = call.args.first().and_then(runtime_default).map(str::to_owned);
            }
            "references" => column.foreign_key = self.resolve_reference(&column.name, call),
            "generatedAlwaysAs" => column.generated = true,
            "generatedAlwaysAsIdentity" | "generatedByDefaultAsIdentity" => column.nullable = false,
            _ => {}
        }
    }

    /// Resolves `.references(() => table.column, { onDelete })`.
    ///
    /// The variable is looked up in the batch registry first. An unknown
    /// variable falls back to its snake_case name and the reference is
    /// flagged as inferred.
    fn resolve_reference(&mut self, column: &str, call: &ChainCall) -> Option<ForeignKeyRef> {
        let Some(ArgValue::Reference { object, property }) = call.args.first() else {
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                format!("column {column}: references() target is not a table column"),
            );
            return None;
        };

        let on_delete = call
            .args
            .get(1)
            .and_then(|options| options.get("onDelete"))
            .and_then(ArgValue::as_str)
            .and_then(OnDelete::parse);

        let reference = if let Some(target) = self.registry.tables.get(object.as_str()) {
            let target_column = target
                .fields
                .iter()
                .find(|f| f.key == *property)
                .map_or_else(
                    || to_snake_case(property),
                    |f| f.column_name().map_or_else(|| to_snake_case(&f.key), str::to_owned),
                );
            ForeignKeyRef::new(&target.name, target_column)
        } else {
            let guessed = to_snake_case(object);
            self.diagnose(
                DiagnosticKind::InferredReference,
                format!("column {column}: table variable {object} not declared; guessing table {guessed}"),
            );
            let mut reference = ForeignKeyRef::new(guessed, to_snake_case(property));
            reference.inferred = true;
            reference
        };

        Some(reference.with_on_delete(on_delete))
    }
}

fn set_choices(column: &mut ColumnDescriptor, values: Vec<String>) {
    if values.is_empty() {
        return;
    }
    column.choices = Some(values);
    let longest = column.longest_choice().unwrap_or_default();
    column.field_type = FieldType::Char {
        max_length: u32::try_from(longest).unwrap_or(u32::MAX),
    };
}

/// Renders a `.default(...)` argument as a SQL-style literal.
fn default_literal(value: &ArgValue) -> Option<String> {
    match value {
        ArgValue::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        ArgValue::Number(n) => Some(n.clone()),
        ArgValue::Bool(b) => Some(b.to_string()),
        ArgValue::Null => Some("NULL".to_owned()),
        ArgValue::Sql(s) => Some(s.trim().to_owned()),
        ArgValue::Object(_) | ArgValue::Array(_) => to_json(value).map(|json| format!("'{json}'")),
        ArgValue::Identifier(_) | ArgValue::Reference { .. } | ArgValue::Raw(_) => None,
    }
}

/// Recognizes the common `$defaultFn` bodies.
fn runtime_default(value: &ArgValue) -> Option<&'static str> {
    let ArgValue::Raw(body) = value else {
        return None;
    };
    let lowered = body.to_ascii_lowercase();
    if lowered.contains("new date") || lowered.contains("date.now") {
        Some(NOW_DEFAULT)
    } else if lowered.contains("uuid") {
        Some(RANDOM_UUID_DEFAULT)
    } else {
        None
    }
}

fn to_json(value: &ArgValue) -> Option<serde_json::Value> {
    use serde_json::Value;
    Some(match value {
        ArgValue::String(s) => Value::String(s.clone()),
        ArgValue::Number(n) => serde_json::from_str(n).ok()?,
        ArgValue::Bool(b) => Value::Bool(*b),
        ArgValue::Null => Value::Null,
        ArgValue::Array(items) => Value::Array(items.iter().map(to_json).collect::<Option<_>>()?),
        ArgValue::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| to_json(v).map(|v| (k.clone(), v)))
                .collect::<Option<_>>()?,
        ),
        _ => return None,
    })
}
