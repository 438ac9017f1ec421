//! Syntax-level extraction of Drizzle ORM declarations.
//!
//! This module reads `pgTable(...)` and `pgEnum(...)` declarations out of a
//! parsed tree without interpreting them. Column builders, chained modifiers,
//! and their arguments are returned as [`ArgValue`] trees; resolving types,
//! references, and defaults is left to the schema crate.
//!
//! Recognized shapes:
//!
//! ```text
//! export const claims = pgTable('claims', {
//!   id: uuid('id').primaryKey().defaultRandom(),
//!   status: claimStatus('status').notNull().default('open'),
//!   orgId: uuid('organization_id').references(() => organizations.id, { onDelete: 'cascade' }),
//! }, (t) => ({
//!   uniq: unique().on(t.orgId, t.number),
//! }));
//!
//! export const claimStatus = pgEnum('claim_status', ['open', 'closed']);
//! ```

use tree_sitter::{Node, Tree};

use crate::node::{named_children, node_line, node_text, unquote, unwrap_expression};

/// Callee names that declare a table.
const TABLE_BUILDERS: &[&str] = &["pgTable", "pgTableCreator", "mysqlTable", "sqliteTable"];

/// Callee names that declare an enum type.
const ENUM_BUILDERS: &[&str] = &["pgEnum"];

/// A literal or reference appearing as a call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// String literal, quotes removed.
    String(String),
    /// Numeric literal as written.
    Number(String),
    /// `true` or `false`.
    Bool(bool),
    /// `null` or `undefined`.
    Null,
    /// A bare identifier.
    Identifier(String),
    /// `object.property`, including the body of `() => object.property`.
    Reference {
        /// Object name (`organizations`, `t`).
        object: String,
        /// Property name (`id`).
        property: String,
    },
    /// Object literal entries in source order.
    Object(Vec<(String, ArgValue)>),
    /// Array literal elements.
    Array(Vec<ArgValue>),
    /// The body of a `` sql`...` `` template.
    Sql(String),
    /// Any other expression, as written.
    Raw(String),
}

impl ArgValue {
    /// Returns the string payload of a [`String`](Self::String).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a numeric literal parsed as `u32`.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Looks up a key in an [`Object`](Self::Object).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the string elements of an [`Array`](Self::Array), skipping others.
    #[must_use]
    pub fn string_items(&self) -> Option<Vec<String>> {
        match self {
            Self::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// One chained modifier call, such as `.notNull()` or `.default('open')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCall {
    /// Method name.
    pub method: String,
    /// Arguments in order.
    pub args: Vec<ArgValue>,
}

/// One column entry in a table's field object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Object key (`orgId`).
    pub key: String,
    /// Base builder name (`uuid`, `varchar`, or an enum variable).
    pub builder: String,
    /// Base builder arguments.
    pub args: Vec<ArgValue>,
    /// Chained modifiers in call order.
    pub chain: Vec<ChainCall>,
    /// 1-based line number.
    pub line: usize,
}

impl FieldDecl {
    /// The explicit column name, if the builder was given one.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        self.args.first().and_then(ArgValue::as_str)
    }

    /// The builder's options object (`{ length: 50 }`), wherever it appears.
    #[must_use]
    pub fn options(&self) -> Option<&ArgValue> {
        self.args.iter().find(|a| matches!(a, ArgValue::Object(_)))
    }

    /// Returns the first chained call to `method`.
    #[must_use]
    pub fn call(&self, method: &str) -> Option<&ChainCall> {
        self.chain.iter().find(|c| c.method == method)
    }

    /// Returns `true` if `method` appears anywhere in the chain.
    #[must_use]
    pub fn has_call(&self, method: &str) -> bool {
        self.call(method).is_some()
    }
}

/// The kind of a table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `unique().on(...)` or `uniqueIndex().on(...)`.
    Unique,
    /// `primaryKey(...)`.
    PrimaryKey,
}

/// A table-level constraint from the third `pgTable` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDecl {
    /// Constraint kind.
    pub kind: ConstraintKind,
    /// Field keys the constraint covers, in order.
    pub fields: Vec<String>,
}

/// A field-object entry that did not yield a column, such as `...timestamps`
/// or `total: computeTotal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// The entry's key, or its full text when it has none.
    pub text: String,
    /// 1-based line number.
    pub line: usize,
}

/// One `pgTable` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDecl {
    /// The variable the table is bound to.
    pub variable: String,
    /// The table name string.
    pub name: String,
    /// Columns in declaration order.
    pub fields: Vec<FieldDecl>,
    /// Table-level constraints.
    pub constraints: Vec<ConstraintDecl>,
    /// Field entries that could not be read as columns.
    pub skipped: Vec<SkippedEntry>,
    /// 1-based line number.
    pub line: usize,
}

/// One `pgEnum` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    /// The variable the enum is bound to.
    pub variable: String,
    /// The database type name.
    pub name: String,
    /// Enum values in declaration order.
    pub values: Vec<String>,
    /// 1-based line number.
    pub line: usize,
}

/// All Drizzle declarations found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrizzleModule {
    /// Table declarations in source order.
    pub tables: Vec<TableDecl>,
    /// Enum declarations in source order.
    pub enums: Vec<EnumDecl>,
}

/// Extracts table and enum declarations from a parsed tree.
///
/// Only top-level `const` declarations (exported or not) are considered.
/// Malformed declarations are skipped.
#[must_use]
pub fn extract_drizzle(tree: &Tree, source: &str) -> DrizzleModule {
    let mut module = DrizzleModule::default();

    for statement in named_children(tree.root_node()) {
        let declaration = if statement.kind() == "export_statement" {
            match statement.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => continue,
            }
        } else {
            statement
        };

        if !matches!(declaration.kind(), "lexical_declaration" | "variable_declaration") {
            continue;
        }

        for declarator in named_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            visit_declarator(declarator, source, &mut module);
        }
    }

    module
}

fn visit_declarator(declarator: Node<'_>, source: &str, module: &mut DrizzleModule) {
    let Some(name) = declarator.child_by_field_name("name") else {
        return;
    };
    let Some(value) = declarator.child_by_field_name("value") else {
        return;
    };
    let value = unwrap_expression(value);
    if value.kind() != "call_expression" {
        return;
    }
    let Some(callee) = callee_name(value, source) else {
        return;
    };

    let variable = node_text(name, source).to_owned();
    let args = call_arguments(value);

    if TABLE_BUILDERS.contains(&callee) || is_schema_member(value, source, "table") {
        if let Some(table) = table_decl(variable, &args, source, node_line(value)) {
            module.tables.push(table);
        }
    } else if ENUM_BUILDERS.contains(&callee) || is_schema_member(value, source, "enum") {
        if let Some(decl) = enum_decl(variable, &args, source, node_line(value)) {
            module.enums.push(decl);
        }
    }
}

/// `mySchema.table(...)` and `mySchema.enum(...)` forms.
fn is_schema_member(call: Node<'_>, source: &str, method: &str) -> bool {
    call.child_by_field_name("function")
        .filter(|f| f.kind() == "member_expression")
        .and_then(|f| f.child_by_field_name("property"))
        .is_some_and(|p| node_text(p, source) == method)
}

fn callee_name<'s>(call: Node<'_>, source: &'s str) -> Option<&'s str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(node_text(function, source)),
        "member_expression" => function
            .child_by_field_name("property")
            .map(|p| node_text(p, source)),
        _ => None,
    }
}

fn call_arguments(call: Node<'_>) -> Vec<Node<'_>> {
    call.child_by_field_name("arguments")
        .map(|args| named_children(args).collect())
        .unwrap_or_default()
}

fn table_decl(variable: String, args: &[Node<'_>], source: &str, line: usize) -> Option<TableDecl> {
    let name = string_literal(*args.first()?, source)?;
    let fields_node = object_body(*args.get(1)?)?;

    let mut fields = Vec::new();
    let mut skipped = Vec::new();
    for entry in named_children(fields_node) {
        if entry.kind() == "comment" {
            continue;
        }
        let field = (entry.kind() == "pair")
            .then(|| field_decl(entry, source))
            .flatten();
        match field {
            Some(field) => fields.push(field),
            None => skipped.push(skipped_entry(entry, source)),
        }
    }

    let mut constraints = Vec::new();
    if let Some(extra) = args.get(2) {
        collect_constraints(*extra, source, &mut constraints);
    }

    Some(TableDecl {
        variable,
        name,
        fields,
        constraints,
        skipped,
        line,
    })
}

fn skipped_entry(entry: Node<'_>, source: &str) -> SkippedEntry {
    let text = entry
        .child_by_field_name("key")
        .map_or_else(|| node_text(entry, source).to_owned(), |key| property_key(key, source));
    SkippedEntry {
        text,
        line: node_line(entry),
    }
}

fn enum_decl(variable: String, args: &[Node<'_>], source: &str, line: usize) -> Option<EnumDecl> {
    let name = string_literal(*args.first()?, source)?;
    let values = convert_value(*args.get(1)?, source).string_items()?;
    Some(EnumDecl {
        variable,
        name,
        values,
        line,
    })
}

/// Resolves the field object of a table, accepting `{...}` or `(t) => ({...})`.
fn object_body(node: Node<'_>) -> Option<Node<'_>> {
    let node = unwrap_expression(node);
    match node.kind() {
        "object" => Some(node),
        "arrow_function" => object_body(node.child_by_field_name("body")?),
        _ => None,
    }
}

fn string_literal(node: Node<'_>, source: &str) -> Option<String> {
    let node = unwrap_expression(node);
    matches!(node.kind(), "string" | "template_string").then(|| unquote(node_text(node, source)))
}

fn property_key(key: Node<'_>, source: &str) -> String {
    match key.kind() {
        "string" => unquote(node_text(key, source)),
        _ => node_text(key, source).to_owned(),
    }
}

fn field_decl(pair: Node<'_>, source: &str) -> Option<FieldDecl> {
    let key = property_key(pair.child_by_field_name("key")?, source);
    let value = pair.child_by_field_name("value")?;
    let (builder, args, chain) = unwind_chain(value, source)?;
    Some(FieldDecl {
        key,
        builder,
        args,
        chain,
        line: node_line(pair),
    })
}

/// Walks a call chain from the outermost call down to its base builder.
///
/// `uuid('id').notNull().default(x)` yields builder `uuid`, args `['id']`,
/// and the chain `[notNull(), default(x)]`. A callback builder such as
/// `t.uuid('id')` is treated like a bare `uuid('id')`.
fn unwind_chain(node: Node<'_>, source: &str) -> Option<(String, Vec<ArgValue>, Vec<ChainCall>)> {
    let mut chain = Vec::new();
    let mut current = unwrap_expression(node);

    loop {
        if current.kind() != "call_expression" {
            return None;
        }
        let function = current.child_by_field_name("function")?;
        let args: Vec<ArgValue> = call_arguments(current)
            .into_iter()
            .map(|arg| convert_value(arg, source))
            .collect();

        match function.kind() {
            "identifier" => {
                chain.reverse();
                return Some((node_text(function, source).to_owned(), args, chain));
            }
            "member_expression" => {
                let object = unwrap_expression(function.child_by_field_name("object")?);
                let method = node_text(function.child_by_field_name("property")?, source).to_owned();
                if object.kind() == "call_expression" {
                    chain.push(ChainCall { method, args });
                    current = object;
                } else {
                    chain.reverse();
                    return Some((method, args, chain));
                }
            }
            _ => return None,
        }
    }
}

/// Converts an expression into an [`ArgValue`].
fn convert_value(node: Node<'_>, source: &str) -> ArgValue {
    let node = unwrap_expression(node);
    match node.kind() {
        "string" | "template_string" => ArgValue::String(unquote(node_text(node, source))),
        "number" => ArgValue::Number(node_text(node, source).to_owned()),
        "true" => ArgValue::Bool(true),
        "false" => ArgValue::Bool(false),
        "null" | "undefined" => ArgValue::Null,
        "identifier" => ArgValue::Identifier(node_text(node, source).to_owned()),
        "member_expression" => member_reference(node, source)
            .unwrap_or_else(|| ArgValue::Raw(node_text(node, source).to_owned())),
        "object" => ArgValue::Object(
            named_children(node)
                .filter_map(|entry| match entry.kind() {
                    "pair" => {
                        let key = property_key(entry.child_by_field_name("key")?, source);
                        let value = convert_value(entry.child_by_field_name("value")?, source);
                        Some((key, value))
                    }
                    "shorthand_property_identifier" => {
                        let name = node_text(entry, source).to_owned();
                        Some((name.clone(), ArgValue::Identifier(name)))
                    }
                    _ => None,
                })
                .collect(),
        ),
        "array" => ArgValue::Array(
            named_children(node)
                .map(|item| convert_value(item, source))
                .collect(),
        ),
        "arrow_function" => match node.child_by_field_name("body") {
            Some(body) if body.kind() == "statement_block" => returned_value(body, source)
                .unwrap_or_else(|| ArgValue::Raw(node_text(node, source).to_owned())),
            Some(body) => convert_value(body, source),
            None => ArgValue::Raw(node_text(node, source).to_owned()),
        },
        "call_expression" => sql_template(node, source)
            .unwrap_or_else(|| ArgValue::Raw(node_text(node, source).to_owned())),
        _ => ArgValue::Raw(node_text(node, source).to_owned()),
    }
}

fn member_reference(node: Node<'_>, source: &str) -> Option<ArgValue> {
    let object = unwrap_expression(node.child_by_field_name("object")?);
    let property = node.child_by_field_name("property")?;
    (object.kind() == "identifier").then(|| ArgValue::Reference {
        object: node_text(object, source).to_owned(),
        property: node_text(property, source).to_owned(),
    })
}

/// `() => { return users.id; }`
fn returned_value(block: Node<'_>, source: &str) -> Option<ArgValue> {
    named_children(block)
        .find(|stmt| stmt.kind() == "return_statement")
        .and_then(|stmt| stmt.named_child(0))
        .map(|expr| convert_value(expr, source))
}

/// `` sql`now()` `` parses as a call whose arguments node is a template string.
fn sql_template(call: Node<'_>, source: &str) -> Option<ArgValue> {
    let function = call.child_by_field_name("function")?;
    let arguments = call.child_by_field_name("arguments")?;
    (node_text(function, source) == "sql" && arguments.kind() == "template_string")
        .then(|| ArgValue::Sql(unquote(node_text(arguments, source))))
}

/// Finds `unique().on(...)`, `uniqueIndex().on(...)`, and `primaryKey(...)`
/// anywhere inside the extra-config argument.
fn collect_constraints(node: Node<'_>, source: &str, out: &mut Vec<ConstraintDecl>) {
    if node.kind() == "call_expression" {
        if let Some(decl) = constraint_from_call(node, source) {
            out.push(decl);
        }
    }
    for child in named_children(node) {
        collect_constraints(child, source, out);
    }
}

fn constraint_from_call(call: Node<'_>, source: &str) -> Option<ConstraintDecl> {
    let function = call.child_by_field_name("function")?;
    let args: Vec<ArgValue> = call_arguments(call)
        .into_iter()
        .map(|arg| convert_value(arg, source))
        .collect();

    match function.kind() {
        "member_expression" => {
            let property = function.child_by_field_name("property")?;
            if node_text(property, source) != "on" {
                return None;
            }
            let target = unwrap_expression(function.child_by_field_name("object")?);
            let root = callee_name(target, source)?;
            matches!(root, "unique" | "uniqueIndex").then(|| ConstraintDecl {
                kind: ConstraintKind::Unique,
                fields: referenced_properties(&args),
            })
        }
        "identifier" if node_text(function, source) == "primaryKey" => {
            let fields = match args.first() {
                Some(options @ ArgValue::Object(_)) => options
                    .get("columns")
                    .map(|cols| match cols {
                        ArgValue::Array(items) => referenced_properties(items),
                        _ => Vec::new(),
                    })
                    .unwrap_or_default(),
                _ => referenced_properties(&args),
            };
            Some(ConstraintDecl {
                kind: ConstraintKind::PrimaryKey,
                fields,
            })
        }
        _ => None,
    }
}

fn referenced_properties(args: &[ArgValue]) -> Vec<String> {
    args.iter()
        .filter_map(|arg| match arg {
            ArgValue::Reference { property, .. } => Some(property.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::TsParser;

    use super::*;

    fn parse(source: &str) -> DrizzleModule {
        TsParser::new().unwrap().drizzle(source).unwrap()
    }

    const CLAIMS: &str = r#"
import { pgTable, pgEnum, uuid, varchar, text, timestamp, unique } from 'drizzle-orm/pg-core';
import { organizations } from './organizations-schema';

export const claimStatus = pgEnum('claim_status', ['open', 'in_review', 'closed']);

export const claims = pgTable('claims', {
  id: uuid('id').primaryKey().defaultRandom(),
  organizationId: uuid('organization_id')
    .notNull()
    .references(() => organizations.id, { onDelete: 'cascade' }),
  number: varchar('claim_number', { length: 50 }).notNull(),
  status: claimStatus('status').default('open'),
  // free text
  notes: text('notes'),
  createdAt: timestamp('created_at', { withTimezone: true }).defaultNow(),
}, (t) => ({
  orgNumber: unique('claims_org_number').on(t.organizationId, t.number),
}));
"#;

    #[test]
    fn test_extracts_enum() {
        let module = parse(CLAIMS);
        assert_eq!(module.enums.len(), 1);
        let decl = &module.enums[0];
        assert_eq!(decl.variable, "claimStatus");
        assert_eq!(decl.name, "claim_status");
        assert_eq!(decl.values, vec!["open", "in_review", "closed"]);
    }

    #[test]
    fn test_extracts_table_fields_in_order() {
        let module = parse(CLAIMS);
        assert_eq!(module.tables.len(), 1);
        let table = &module.tables[0];
        assert_eq!(table.variable, "claims");
        assert_eq!(table.name, "claims");
        let keys: Vec<_> = table.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["id", "organizationId", "number", "status", "notes", "createdAt"]
        );
    }

    #[test]
    fn test_chain_unwinding() {
        let module = parse(CLAIMS);
        let id = &module.tables[0].fields[0];
        assert_eq!(id.builder, "uuid");
        assert_eq!(id.column_name(), Some("id"));
        let methods: Vec<_> = id.chain.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, vec!["primaryKey", "defaultRandom"]);
    }

    #[test]
    fn test_reference_and_options() {
        let module = parse(CLAIMS);
        let org = &module.tables[0].fields[1];
        let references = org.call("references").unwrap();
        assert_eq!(
            references.args[0],
            ArgValue::Reference {
                object: "organizations".to_owned(),
                property: "id".to_owned(),
            }
        );
        assert_eq!(
            references.args[1].get("onDelete").and_then(ArgValue::as_str),
            Some("cascade")
        );
        assert!(org.has_call("notNull"));

        let number = &module.tables[0].fields[2];
        assert_eq!(number.options().and_then(|o| o.get("length")).and_then(ArgValue::as_u32), Some(50));
    }

    #[test]
    fn test_enum_builder_field() {
        let module = parse(CLAIMS);
        let status = &module.tables[0].fields[3];
        assert_eq!(status.builder, "claimStatus");
        assert_eq!(
            status.call("default").map(|c| c.args.clone()),
            Some(vec![ArgValue::String("open".to_owned())])
        );
    }

    #[test]
    fn test_unique_constraint() {
        let module = parse(CLAIMS);
        assert_eq!(
            module.tables[0].constraints,
            vec![ConstraintDecl {
                kind: ConstraintKind::Unique,
                fields: vec!["organizationId".to_owned(), "number".to_owned()],
            }]
        );
    }

    #[test]
    fn test_primary_key_columns_and_array_form() {
        let module = parse(
            r"
export const memberRoles = pgTable('member_roles', {
  memberId: uuid('member_id').notNull(),
  roleId: uuid('role_id').notNull(),
  tags: text('tags').array(),
}, (table) => [
  primaryKey({ columns: [table.memberId, table.roleId] }),
]);
",
        );
        let table = &module.tables[0];
        assert_eq!(table.constraints.len(), 1);
        assert_eq!(table.constraints[0].kind, ConstraintKind::PrimaryKey);
        assert_eq!(table.constraints[0].fields, vec!["memberId", "roleId"]);
        assert!(table.fields[2].has_call("array"));
    }

    #[test]
    fn test_sql_default_and_block_reference() {
        let module = parse(
            r"
const notes = pgTable('notes', {
  authorId: uuid('author_id').references(() => { return users.id; }),
  createdAt: timestamp('created_at').default(sql`now()`),
});
",
        );
        let table = &module.tables[0];
        assert_eq!(
            table.fields[0].call("references").map(|c| c.args[0].clone()),
            Some(ArgValue::Reference {
                object: "users".to_owned(),
                property: "id".to_owned(),
            })
        );
        assert_eq!(
            table.fields[1].call("default").map(|c| c.args[0].clone()),
            Some(ArgValue::Sql("now()".to_owned()))
        );
    }

    #[test]
    fn test_ignores_non_drizzle_declarations() {
        let module = parse("export const x = compute('a', { b: 1 });\nconst y = 3;\n");
        assert!(module.tables.is_empty());
        assert!(module.enums.is_empty());
    }

    #[test]
    fn test_spread_and_non_call_entries_are_recorded() {
        let module = parse(
            r"
export const invoices = pgTable('invoices', {
  id: uuid('id').primaryKey(),
  ...timestamps,
  total: computeTotal,
  label: 'draft',
  // trailing note
  memo: text('memo'),
});
",
        );
        let table = &module.tables[0];
        let keys: Vec<_> = table.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "memo"]);
        assert_eq!(
            table.skipped,
            vec![
                SkippedEntry {
                    text: "...timestamps".to_owned(),
                    line: 4,
                },
                SkippedEntry {
                    text: "total".to_owned(),
                    line: 5,
                },
                SkippedEntry {
                    text: "label".to_owned(),
                    line: 6,
                },
            ]
        );
    }

    #[test]
    fn test_unnamed_builder_column() {
        let module = parse("export const t = pgTable('t', { fullName: text().notNull() });");
        let field = &module.tables[0].fields[0];
        assert_eq!(field.builder, "text");
        assert_eq!(field.column_name(), None);
    }
}
