//! Module rendering.
//!
//! Every module (Django app) gets six files. Models are rendered here; the
//! other files live in [`crate::api`] and [`crate::admin`].

use std::collections::BTreeMap;

use tracing::{debug, warn};
use ue_core::reserved::python_attribute_name;
use ue_core::{CodegenConfig, ColumnDescriptor, FieldType, FxHashMap, TableDescriptor};

use crate::admin::{render_admin, render_tests};
use crate::api::{render_serializers, render_urls, render_views};
use crate::fields::{attribute_name, py_str, render_field, FieldLine, Imports, Relation};
use crate::registry::ModelRegistry;

/// Columns preferred for `__str__`, in priority order.
const DISPLAY_COLUMNS: &[&str] = &["name", "title", "subject", "label", "email", "code", "number"];

/// The synthesized surrogate key every model declares.
const ID_FIELD: &str = "id = models.UUIDField(primary_key=True, default=uuid.uuid4, editable=False)";

/// The generated sources of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSources {
    /// Module (Django app) name.
    pub module: String,
    /// `models.py`
    pub models: String,
    /// `serializers.py`
    pub serializers: String,
    /// `views.py`
    pub views: String,
    /// `admin.py`
    pub admin: String,
    /// `tests.py`
    pub tests: String,
    /// `urls.py`
    pub urls: String,
}

impl ModuleSources {
    /// File names paired with their contents, in write order.
    #[must_use]
    pub fn files(&self) -> [(&'static str, &str); 6] {
        [
            ("models.py", &self.models),
            ("serializers.py", &self.serializers),
            ("views.py", &self.views),
            ("admin.py", &self.admin),
            ("tests.py", &self.tests),
            ("urls.py", &self.urls),
        ]
    }
}

/// Groups tables by module, ordered by module name then declaration order.
#[must_use]
pub fn group_by_module(tables: &[TableDescriptor]) -> BTreeMap<&str, Vec<&TableDescriptor>> {
    let mut modules: BTreeMap<&str, Vec<&TableDescriptor>> = BTreeMap::new();
    for table in tables {
        modules.entry(table.module.as_str()).or_default().push(table);
    }
    modules
}

/// Joins lines into a file body ending in exactly one newline.
pub(crate) fn finish(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Renders Django sources for parsed tables.
///
/// # Examples
///
/// ```
/// use ue_codegen::{Emitter, ModelRegistry};
/// use ue_core::{CodegenConfig, ColumnDescriptor, FieldType, SourceDialect, TableDescriptor};
///
/// let mut table = TableDescriptor::new("notes", "notes", SourceDialect::Sql, "notes.sql");
/// table.columns.push(ColumnDescriptor::new("body", "TEXT", FieldType::Text));
/// let tables = vec![table];
///
/// let config = CodegenConfig::default();
/// let registry = ModelRegistry::from_tables(&tables);
/// let sources = Emitter::new(&config, &registry).render_all(&tables);
///
/// assert_eq!(sources[0].module, "notes");
/// assert!(sources[0].models.contains("class Note(BaseModel):"));
/// assert!(sources[0].models.contains("id = models.UUIDField(primary_key=True"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    config: &'a CodegenConfig,
    registry: &'a ModelRegistry,
}

/// One model's lines plus what its module header needs.
struct RenderedModel {
    lines: Vec<String>,
    imports: Imports,
    tenant: bool,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter.
    #[must_use]
    pub const fn new(config: &'a CodegenConfig, registry: &'a ModelRegistry) -> Self {
        Self { config, registry }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CodegenConfig {
        self.config
    }

    /// Returns `true` if the model derives from the tenant base class.
    ///
    /// A model is tenant-scoped when it has a foreign key to the tenant
    /// table. The tenant table itself never is.
    #[must_use]
    pub fn is_tenant(&self, table: &TableDescriptor) -> bool {
        table.table_name != self.config.tenant_table && table.references_table(&self.config.tenant_table)
    }

    /// The registry used to resolve foreign-key targets.
    pub(crate) const fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    /// Columns that become fields on the generated model.
    ///
    /// Emittable columns minus the tenant foreign key, which the tenant base
    /// class declares.
    #[must_use]
    pub fn model_columns<'t>(&self, table: &'t TableDescriptor) -> Vec<&'t ColumnDescriptor> {
        table
            .emittable_columns()
            .filter(|c| !self.is_tenant_column(table, c))
            .collect()
    }

    /// Returns `true` for the tenant foreign key the base class already declares.
    fn is_tenant_column(&self, table: &TableDescriptor, column: &ColumnDescriptor) -> bool {
        self.is_tenant(table)
            && column
                .foreign_key
                .as_ref()
                .is_some_and(|fk| fk.table == self.config.tenant_table)
            && attribute_name(column) == self.config.tenant_field
    }

    /// The attribute name `column` has on the generated model.
    pub(crate) fn model_attribute(&self, table: &TableDescriptor, column: &str) -> String {
        match table.column(column) {
            Some(c) if self.is_tenant_column(table, c) => self.config.tenant_field.clone(),
            Some(c) => attribute_name(c),
            None => python_attribute_name(column).into_owned(),
        }
    }

    /// Renders every module.
    #[must_use]
    pub fn render_all(&self, tables: &[TableDescriptor]) -> Vec<ModuleSources> {
        group_by_module(tables)
            .into_iter()
            .map(|(module, tables)| self.render_module(module, &tables))
            .collect()
    }

    /// Renders all six files of one module.
    #[must_use]
    pub fn render_module(&self, module: &str, tables: &[&TableDescriptor]) -> ModuleSources {
        debug!(module, tables = tables.len(), "rendering module");
        ModuleSources {
            module: module.to_owned(),
            models: self.render_models(module, tables),
            serializers: render_serializers(module, tables),
            views: render_views(self, module, tables),
            admin: render_admin(self, module, tables),
            tests: render_tests(self, module, tables),
            urls: render_urls(module, tables),
        }
    }

    /// Renders `models.py`.
    #[must_use]
    pub fn render_models(&self, module: &str, tables: &[&TableDescriptor]) -> String {
        let rendered: Vec<RenderedModel> = tables.iter().map(|t| self.model(t)).collect();

        let mut imports = Imports::default();
        let mut bases: Vec<&str> = Vec::new();
        for model in &rendered {
            imports.merge(model.imports);
            let base = if model.tenant {
                self.config.tenant_base_class.as_str()
            } else {
                self.config.plain_base_class.as_str()
            };
            if !bases.contains(&base) {
                bases.push(base);
            }
        }
        bases.sort_unstable();

        let mut lines = vec![format!("\"\"\"Models for the {module} module.\"\"\""), String::new()];
        if imports.uuid {
            lines.push("import uuid".to_owned());
            lines.push(String::new());
        }
        if imports.array_field {
            lines.push("from django.contrib.postgres.fields import ArrayField".to_owned());
        }
        lines.push("from django.db import models".to_owned());
        if imports.timezone {
            lines.push("from django.utils import timezone".to_owned());
        }
        lines.push(String::new());
        lines.push(format!("from {} import {}", self.config.base_module, bases.join(", ")));

        for model in rendered {
            lines.push(String::new());
            lines.push(String::new());
            lines.extend(model.lines);
        }
        finish(&lines)
    }

    fn model(&self, table: &TableDescriptor) -> RenderedModel {
        let tenant = self.is_tenant(table);
        let mut imports = Imports {
            uuid: true,
            ..Imports::default()
        };

        let columns = self.model_columns(table);

        let mut per_target: FxHashMap<&str, usize> = FxHashMap::default();
        for fk in columns.iter().filter_map(|c| c.foreign_key.as_ref()) {
            *per_target.entry(fk.table.as_str()).or_default() += 1;
        }

        let mut fields: Vec<FieldLine> = Vec::with_capacity(columns.len());
        for column in &columns {
            let line = match &column.foreign_key {
                Some(fk) => {
                    let target = self.registry.target(&table.table_name, &fk.table);
                    if target.is_unresolved() {
                        warn!(
                            table = %table.table_name,
                            column = %column.name,
                            target = %fk.table,
                            "foreign key target is not a parsed table"
                        );
                    }
                    let related_name = (per_target.get(fk.table.as_str()).copied().unwrap_or(0) > 1)
                        .then(|| format!("{}_{}", table.table_name, attribute_name(column)));
                    render_field(column, Some(&Relation { target: &target, related_name }))
                }
                None => render_field(column, None),
            };
            imports.merge(line.imports);
            fields.push(line);
        }

        let base = if tenant {
            &self.config.tenant_base_class
        } else {
            &self.config.plain_base_class
        };
        let mut lines = vec![
            format!("class {}({base}):", table.model_name),
            format!("    \"\"\"Model for the {} table.\"\"\"", table.table_name),
        ];

        for block in fields.iter().filter_map(|f| f.choices.as_ref()) {
            lines.push(String::new());
            lines.push(format!("    {} = [", block.constant));
            for (value, label) in &block.values {
                lines.push(format!("        ({}, {}),", py_str(value), py_str(label)));
            }
            lines.push("    ]".to_owned());
        }

        lines.push(String::new());
        lines.push(format!("    {ID_FIELD}"));
        for field in &fields {
            lines.push(format!("    {} = {}", field.attribute, field.definition));
        }

        lines.push(String::new());
        lines.push("    class Meta:".to_owned());
        lines.push(format!("        db_table = {}", py_str(&table.table_name)));
        if !table.unique_together.is_empty() {
            let groups: Vec<String> = table
                .unique_together
                .iter()
                .map(|group| {
                    let names: Vec<String> = group
                        .iter()
                        .map(|c| py_str(&self.model_attribute(table, c)))
                        .collect();
                    format!("({})", names.join(", "))
                })
                .collect();
            lines.push(format!("        unique_together = [{}]", groups.join(", ")));
        }

        lines.push(String::new());
        lines.push("    def __str__(self):".to_owned());
        lines.push(match display_attribute(&columns) {
            Some(attribute) => format!("        return str(self.{attribute})"),
            None => format!("        return f\"{} {{self.id}}\"", table.model_name),
        });

        RenderedModel {
            lines,
            imports,
            tenant,
        }
    }
}

/// Picks the attribute `__str__` returns.
fn display_attribute(columns: &[&ColumnDescriptor]) -> Option<String> {
    let plain = |c: &&&ColumnDescriptor| c.foreign_key.is_none() && !c.is_array;
    DISPLAY_COLUMNS
        .iter()
        .find_map(|name| columns.iter().filter(plain).find(|c| c.name == *name))
        .or_else(|| {
            columns
                .iter()
                .filter(plain)
                .find(|c| c.field_type.is_textual() && !c.has_choices())
        })
        .map(|c| attribute_name(c))
}

/// Returns `true` if a serializer should mark the column read-only.
pub(crate) fn is_read_only(column: &ColumnDescriptor) -> bool {
    matches!(column.field_type, FieldType::DateTime) && matches!(column.name.as_str(), "created_at" | "updated_at")
}
