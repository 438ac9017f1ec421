//! Django admin registrations and model smoke tests.

use ue_core::{ColumnDescriptor, FieldType, TableDescriptor};

use crate::emitter::{finish, Emitter};
use crate::fields::{attribute_name, py_str};

/// Maximum number of columns shown in an admin change list.
const LIST_DISPLAY_LIMIT: usize = 6;

fn listable(column: &ColumnDescriptor) -> bool {
    !column.is_array && !matches!(column.field_type, FieldType::Json | FieldType::Binary | FieldType::Text)
}

fn quoted(names: impl Iterator<Item = String>) -> String {
    names.map(|n| py_str(&n)).collect::<Vec<_>>().join(", ")
}

/// Renders `admin.py`.
pub(crate) fn render_admin(emitter: &Emitter<'_>, module: &str, tables: &[&TableDescriptor]) -> String {
    let mut lines = vec![
        format!("\"\"\"Admin registrations for the {module} module.\"\"\""),
        String::new(),
        "from django.contrib import admin".to_owned(),
        String::new(),
        format!(
            "from .models import {}",
            tables.iter().map(|t| t.model_name.as_str()).collect::<Vec<_>>().join(", ")
        ),
    ];

    for table in tables {
        let columns: Vec<&ColumnDescriptor> = table.emittable_columns().collect();

        let display = std::iter::once("id".to_owned()).chain(
            columns
                .iter()
                .filter(|c| listable(c))
                .map(|c| emitter.model_attribute(table, &c.name))
                .take(LIST_DISPLAY_LIMIT - 1),
        );
        let filters: Vec<String> = columns
            .iter()
            .filter(|c| c.has_choices() || matches!(c.field_type, FieldType::Boolean))
            .map(|c| attribute_name(c))
            .collect();
        let search: Vec<String> = columns
            .iter()
            .filter(|c| c.field_type.is_textual() && c.foreign_key.is_none() && !c.has_choices() && !c.is_array)
            .map(|c| attribute_name(c))
            .collect();

        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("@admin.register({})", table.model_name));
        lines.push(format!("class {}Admin(admin.ModelAdmin):", table.model_name));
        lines.push(format!("    list_display = [{}]", quoted(display)));
        if !filters.is_empty() {
            lines.push(format!("    list_filter = [{}]", quoted(filters.into_iter())));
        }
        if !search.is_empty() {
            lines.push(format!("    search_fields = [{}]", quoted(search.into_iter())));
        }
    }
    finish(&lines)
}

/// Renders `tests.py`.
///
/// The tests need no database: they check table names, choice values and
/// the base class of each model.
pub(crate) fn render_tests(emitter: &Emitter<'_>, module: &str, tables: &[&TableDescriptor]) -> String {
    let config = emitter.config();
    let mut lines = vec![
        format!("\"\"\"Model tests for the {module} module.\"\"\""),
        String::new(),
        "from django.test import SimpleTestCase".to_owned(),
        String::new(),
        format!("from {} import {}", config.base_module, {
            let mut bases = vec![config.plain_base_class.as_str(), config.tenant_base_class.as_str()];
            bases.sort_unstable();
            bases.join(", ")
        }),
        String::new(),
        format!(
            "from .models import {}",
            tables.iter().map(|t| t.model_name.as_str()).collect::<Vec<_>>().join(", ")
        ),
    ];

    for table in tables {
        let model = &table.model_name;
        let base = if emitter.is_tenant(table) {
            &config.tenant_base_class
        } else {
            &config.plain_base_class
        };

        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("class {model}ModelTest(SimpleTestCase):"));
        lines.push("    def test_db_table(self):".to_owned());
        lines.push(format!(
            "        self.assertEqual({model}._meta.db_table, {})",
            py_str(&table.table_name)
        ));
        lines.push(String::new());
        lines.push("    def test_base_class(self):".to_owned());
        lines.push(format!("        self.assertTrue(issubclass({model}, {base}))"));

        for column in table.emittable_columns().filter(|c| c.has_choices() && !c.is_array) {
            let attribute = attribute_name(column);
            let values = column.choices.as_deref().unwrap_or_default();
            lines.push(String::new());
            lines.push(format!("    def test_{attribute}_choices(self):"));
            lines.push(format!(
                "        values = [value for value, _ in {model}.{}_CHOICES]",
                attribute.to_ascii_uppercase()
            ));
            lines.push(format!(
                "        self.assertEqual(values, [{}])",
                quoted(values.iter().cloned())
            ));
        }
    }
    finish(&lines)
}
