//! Column to Django field translation.

use std::borrow::Cow;

use ue_core::naming::titleize;
use ue_core::reserved::python_attribute_name;
use ue_core::{ColumnDescriptor, FieldType, OnDelete};

use crate::registry::ModelTarget;

/// Characters added to the longest choice value when sizing a choice field.
pub const CHOICE_PADDING: usize = 10;

/// Imports a rendered field needs in its module header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Imports {
    pub uuid: bool,
    pub timezone: bool,
    pub array_field: bool,
}

impl Imports {
    pub fn merge(&mut self, other: Self) {
        self.uuid |= other.uuid;
        self.timezone |= other.timezone;
        self.array_field |= other.array_field;
    }
}

/// A `STATUS_CHOICES = [...]` class constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceBlock {
    pub constant: String,
    pub values: Vec<(String, String)>,
}

/// One rendered model attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldLine {
    pub attribute: String,
    pub definition: String,
    pub choices: Option<ChoiceBlock>,
    pub imports: Imports,
}

/// Foreign-key details resolved by the emitter.
#[derive(Debug, Clone)]
pub(crate) struct Relation<'a> {
    pub target: &'a ModelTarget,
    pub related_name: Option<String>,
}

/// Quotes a Python string literal.
pub(crate) fn py_str(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Attribute name a foreign-key column becomes.
///
/// Django appends `_id` to the attribute for the database column, so
/// `member_id` becomes `member`. A column without the suffix keeps its name
/// and needs an explicit `db_column`.
pub(crate) fn relation_attribute(column: &str) -> (Cow<'_, str>, bool) {
    match column.strip_suffix("_id") {
        Some(stem) if !stem.is_empty() => (python_attribute_name(stem), false),
        _ => (python_attribute_name(column), true),
    }
}

/// The attribute a column is exposed as on the model.
pub(crate) fn attribute_name(column: &ColumnDescriptor) -> String {
    if column.foreign_key.is_some() {
        relation_attribute(&column.name).0.into_owned()
    } else {
        python_attribute_name(&column.name).into_owned()
    }
}

fn field_class(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Char { .. } => "CharField",
        FieldType::Text => "TextField",
        FieldType::SmallInteger => "SmallIntegerField",
        FieldType::Integer => "IntegerField",
        FieldType::BigInteger => "BigIntegerField",
        FieldType::Decimal { .. } => "DecimalField",
        FieldType::Float => "FloatField",
        FieldType::Boolean => "BooleanField",
        FieldType::Date => "DateField",
        FieldType::DateTime => "DateTimeField",
        FieldType::Time => "TimeField",
        FieldType::Duration => "DurationField",
        FieldType::Uuid => "UUIDField",
        FieldType::Json => "JSONField",
        FieldType::Binary => "BinaryField",
        FieldType::Inet => "GenericIPAddressField",
        FieldType::SearchVector => "SearchVectorField",
        _ => "TextField",
    }
}

fn on_delete_constant(on_delete: Option<OnDelete>) -> &'static str {
    match on_delete.unwrap_or(OnDelete::Cascade) {
        OnDelete::Cascade => "models.CASCADE",
        OnDelete::SetNull => "models.SET_NULL",
        OnDelete::SetDefault => "models.SET_DEFAULT",
        OnDelete::Restrict => "models.RESTRICT",
        OnDelete::NoAction => "models.DO_NOTHING",
    }
}

/// A column default translated into a Python expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PyDefault {
    Expr(String),
    Callable(&'static str),
}

fn python_default(column: &ColumnDescriptor) -> Option<PyDefault> {
    let raw = column.default.as_deref()?.trim();
    let lowered = raw.to_ascii_lowercase();

    if lowered == "null" {
        return None;
    }
    if column.is_array {
        return Some(PyDefault::Callable("list"));
    }
    if lowered.starts_with("now()")
        || lowered.starts_with("current_timestamp")
        || lowered.starts_with("localtimestamp")
    {
        return matches!(column.field_type, FieldType::DateTime).then_some(PyDefault::Callable("timezone.now"));
    }
    if lowered == "gen_random_uuid()" || lowered.starts_with("uuid_generate_v4") {
        return Some(PyDefault::Callable("uuid.uuid4"));
    }
    if lowered == "true" || lowered == "false" {
        return Some(PyDefault::Expr(if lowered == "true" { "True" } else { "False" }.to_owned()));
    }
    if raw.parse::<f64>().is_ok() {
        return Some(PyDefault::Expr(raw.to_owned()));
    }

    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?.replace("''", "'");
    match column.field_type {
        FieldType::Json => match inner.trim() {
            "{}" => Some(PyDefault::Callable("dict")),
            "[]" => Some(PyDefault::Callable("list")),
            _ => None,
        },
        FieldType::Boolean => match inner.to_ascii_lowercase().as_str() {
            "t" | "true" => Some(PyDefault::Expr("True".to_owned())),
            "f" | "false" => Some(PyDefault::Expr("False".to_owned())),
            _ => None,
        },
        ty if ty.is_numeric() => inner.parse::<f64>().is_ok().then(|| PyDefault::Expr(inner.clone())),
        ty if ty.is_textual() => Some(PyDefault::Expr(py_str(&inner))),
        _ => None,
    }
}

/// Arguments describing the stored value: length, precision, choices.
fn type_arguments(column: &ColumnDescriptor, choices: Option<&ChoiceBlock>) -> Vec<String> {
    match column.field_type {
        FieldType::Char { max_length } => {
            let length = column
                .longest_choice()
                .map_or(max_length as usize, |longest| longest + CHOICE_PADDING);
            let mut args = vec![format!("max_length={length}")];
            if let Some(block) = choices {
                args.push(format!("choices={}", block.constant));
            }
            args
        }
        FieldType::Decimal {
            max_digits,
            decimal_places,
        } => vec![
            format!("max_digits={max_digits}"),
            format!("decimal_places={decimal_places}"),
        ],
        _ => Vec::new(),
    }
}

fn choice_block(attribute: &str, column: &ColumnDescriptor) -> Option<ChoiceBlock> {
    if column.is_array {
        return None;
    }
    let values = column.choices.as_ref().filter(|c| !c.is_empty())?;
    Some(ChoiceBlock {
        constant: format!("{}_CHOICES", attribute.to_ascii_uppercase()),
        values: values.iter().map(|v| (v.clone(), titleize(v))).collect(),
    })
}

/// Renders one ordinary or relational column.
///
/// `created_at` and `updated_at` timestamps become `auto_now_add` and
/// `auto_now` fields; their source defaults are dropped.
pub(crate) fn render_field(column: &ColumnDescriptor, relation: Option<&Relation<'_>>) -> FieldLine {
    let mut imports = Imports::default();

    if let (Some(relation), Some(fk)) = (relation, column.foreign_key.as_ref()) {
        let (attribute, needs_db_column) = relation_attribute(&column.name);
        let class = if column.unique { "OneToOneField" } else { "ForeignKey" };
        let mut args = vec![
            py_str(&relation.target.reference()),
            format!("on_delete={}", on_delete_constant(fk.on_delete)),
        ];
        if column.nullable || fk.on_delete == Some(OnDelete::SetNull) {
            args.push("null=True".to_owned());
            args.push("blank=True".to_owned());
        }
        if let Some(name) = &relation.related_name {
            args.push(format!("related_name={}", py_str(name)));
        }
        if needs_db_column {
            args.push(format!("db_column={}", py_str(&column.name)));
        }
        return FieldLine {
            definition: format!("models.{class}({})", args.join(", ")),
            attribute: attribute.into_owned(),
            choices: None,
            imports,
        };
    }

    let attribute = python_attribute_name(&column.name).into_owned();
    let choices = choice_block(&attribute, column);
    let class = field_class(column.field_type);
    let mut args = Vec::new();

    let base = format!(
        "models.{class}({})",
        type_arguments(column, choices.as_ref()).join(", ")
    );
    if column.is_array {
        imports.array_field = true;
    } else {
        args.extend(type_arguments(column, choices.as_ref()));
    }

    if column.unique && !column.is_array {
        args.push("unique=True".to_owned());
    }
    if column.nullable {
        args.push("null=True".to_owned());
        args.push("blank=True".to_owned());
    }

    let is_timestamp = matches!(column.field_type, FieldType::DateTime);
    match column.name.as_str() {
        "created_at" if is_timestamp => args.push("auto_now_add=True".to_owned()),
        "updated_at" if is_timestamp => args.push("auto_now=True".to_owned()),
        _ => match python_default(column) {
            Some(PyDefault::Expr(expr)) => args.push(format!("default={expr}")),
            Some(PyDefault::Callable(callable)) => {
                imports.uuid |= callable.starts_with("uuid.");
                imports.timezone |= callable.starts_with("timezone.");
                args.push(format!("default={callable}"));
            }
            None => {}
        },
    }

    let definition = if column.is_array {
        let mut all = vec![base];
        all.extend(args);
        format!("ArrayField({})", all.join(", "))
    } else {
        format!("models.{class}({})", args.join(", "))
    };

    FieldLine {
        attribute,
        definition,
        choices,
        imports,
    }
}

#[cfg(test)]
mod tests {
    use ue_core::ForeignKeyRef;

    use super::*;

    fn column(name: &str, field_type: FieldType) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "src", field_type)
    }

    #[test]
    fn test_choice_field_is_padded() {
        let mut col = column("status", FieldType::Char { max_length: 8 });
        col.nullable = false;
        col.choices = Some(vec!["open".to_owned(), "resolved".to_owned()]);
        col.default = Some("'open'".to_owned());

        let line = render_field(&col, None);
        assert_eq!(
            line.definition,
            "models.CharField(max_length=18, choices=STATUS_CHOICES, default='open')"
        );
        let block = line.choices.unwrap();
        assert_eq!(block.constant, "STATUS_CHOICES");
        assert_eq!(block.values[1], ("resolved".to_owned(), "Resolved".to_owned()));
    }

    #[test]
    fn test_reserved_attribute_renamed() {
        let line = render_field(&column("class", FieldType::Text), None);
        assert_eq!(line.attribute, "class_field");
        assert_eq!(line.definition, "models.TextField(null=True, blank=True)");
    }

    #[test]
    fn test_decimal_and_unique() {
        let mut col = column(
            "amount",
            FieldType::Decimal {
                max_digits: 12,
                decimal_places: 2,
            },
        );
        col.nullable = false;
        col.unique = true;
        col.default = Some("0".to_owned());
        assert_eq!(
            render_field(&col, None).definition,
            "models.DecimalField(max_digits=12, decimal_places=2, unique=True, default=0)"
        );
    }

    #[test]
    fn test_timestamps_and_callables() {
        let mut created = column("created_at", FieldType::DateTime);
        created.nullable = false;
        created.default = Some("now()".to_owned());
        assert_eq!(
            render_field(&created, None).definition,
            "models.DateTimeField(auto_now_add=True)"
        );

        let mut due = column("due_at", FieldType::DateTime);
        due.default = Some("CURRENT_TIMESTAMP".to_owned());
        let line = render_field(&due, None);
        assert_eq!(
            line.definition,
            "models.DateTimeField(null=True, blank=True, default=timezone.now)"
        );
        assert!(line.imports.timezone);

        let mut meta = column("metadata", FieldType::Json);
        meta.nullable = false;
        meta.default = Some("'{}'".to_owned());
        assert_eq!(render_field(&meta, None).definition, "models.JSONField(default=dict)");
    }

    #[test]
    fn test_array_field() {
        let mut tags = column("tags", FieldType::Char { max_length: 50 });
        tags.is_array = true;
        tags.default = Some("'{}'".to_owned());
        let line = render_field(&tags, None);
        assert_eq!(
            line.definition,
            "ArrayField(models.CharField(max_length=50), null=True, blank=True, default=list)"
        );
        assert!(line.imports.array_field);
    }

    #[test]
    fn test_foreign_key_rendering() {
        let mut col = column("member_id", FieldType::Uuid);
        col.nullable = false;
        col.foreign_key = Some(ForeignKeyRef::new("members", "id").with_on_delete(Some(OnDelete::Restrict)));
        let target = ModelTarget::External {
            module: "members".to_owned(),
            model: "Member".to_owned(),
        };
        let relation = Relation {
            target: &target,
            related_name: None,
        };
        let line = render_field(&col, Some(&relation));
        assert_eq!(line.attribute, "member");
        assert_eq!(
            line.definition,
            "models.ForeignKey('members.Member', on_delete=models.RESTRICT)"
        );
    }

    #[test]
    fn test_set_null_forces_nullable_and_db_column() {
        let mut col = column("reviewer", FieldType::Uuid);
        col.nullable = false;
        col.unique = true;
        col.foreign_key = Some(ForeignKeyRef::new("staff", "id").with_on_delete(Some(OnDelete::SetNull)));
        let target = ModelTarget::Local("Staff".to_owned());
        let relation = Relation {
            target: &target,
            related_name: Some("reviews_reviewer".to_owned()),
        };
        assert_eq!(
            render_field(&col, Some(&relation)).definition,
            "models.OneToOneField('Staff', on_delete=models.SET_NULL, null=True, blank=True, \
             related_name='reviews_reviewer', db_column='reviewer')"
        );
    }

    #[test]
    fn test_py_str_escapes() {
        assert_eq!(py_str("it's"), r"'it\'s'");
        assert_eq!(py_str(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn test_python_default_text_literal_unescapes_sql_quotes() {
        let mut col = column("note", FieldType::Text);
        col.default = Some("'it''s'".to_owned());
        assert_eq!(
            python_default(&col),
            Some(PyDefault::Expr(r"'it\'s'".to_owned()))
        );
        col.default = Some("lower(name)".to_owned());
        assert_eq!(python_default(&col), None);
    }
}
