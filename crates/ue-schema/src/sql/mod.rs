//! SQL schema parser.
//!
//! Parses `CREATE TABLE`, `CREATE TYPE ... AS ENUM`, `ALTER TABLE ... ADD`,
//! and `CREATE UNIQUE INDEX` statements into [`TableDescriptor`]s. Every
//! other statement is ignored. Parsing never fails: fragments that cannot be
//! understood are skipped and recorded as [`Diagnostic`]s.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use ue_core::FieldType;
//! use ue_schema::parse_sql;
//!
//! let parsed = parse_sql(
//!     "CREATE TABLE dues (
//!         id UUID PRIMARY KEY,
//!         amount NUMERIC(10,2) NOT NULL,
//!         status VARCHAR(20) CHECK (status IN ('paid', 'overdue'))
//!     );",
//!     Utf8Path::new("billing.sql"),
//! );
//!
//! let dues = &parsed.tables[0];
//! assert_eq!(dues.module, "billing");
//! assert_eq!(dues.columns.len(), 3);
//! assert_eq!(dues.columns[1].field_type, FieldType::Decimal { max_digits: 10, decimal_places: 2 });
//! assert_eq!(dues.columns[2].choices.as_deref(), Some(&["paid".to_owned(), "overdue".to_owned()][..]));
//! ```

mod lexer;

use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use ue_core::{CodegenConfig, ColumnDescriptor, FieldType, ForeignKeyRef, OnDelete, SourceDialect, TableDescriptor};
use ue_core::FxHashMap;

use self::lexer::{
    balanced_group, find_top_level, split_statements, split_top_level, string_literals, strip_comments,
    tokenize, Token, TokenKind,
};
use crate::diagnostics::{record, Diagnostic, DiagnosticKind, ParsedSchema};
use crate::module::module_for_path;
use crate::typemap::{map_sql_type, SqlType};

/// A possibly schema-qualified, possibly quoted name.
const NAME: &str = r#"(?:"[^"]+"|[\w$]+)(?:\s*\.\s*(?:"[^"]+"|[\w$]+))*"#;

/// Keywords that end a column's type and start a constraint clause.
const CLAUSE_KEYWORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "DEFAULT",
    "REFERENCES",
    "CHECK",
    "GENERATED",
    "COLLATE",
];

/// Keywords that start a table-level constraint inside `CREATE TABLE`.
const TABLE_CONSTRAINT_KEYWORDS: &[&str] =
    &["CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK", "EXCLUDE"];

static CREATE_TABLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?P<name>{NAME})\s*\("
    ))
    .ok()
});

static CREATE_ENUM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*CREATE\s+TYPE\s+(?P<name>{NAME})\s+AS\s+ENUM\s*\("
    ))
    .ok()
});

static ALTER_TABLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(?P<name>{NAME})\s+(?P<actions>.+)$"
    ))
    .ok()
});

static CREATE_UNIQUE_INDEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*CREATE\s+UNIQUE\s+INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?(?:{NAME}\s+)?ON\s+(?:ONLY\s+)?(?P<name>{NAME})\s*(?:USING\s+\w+\s*)?\("
    ))
    .ok()
});

/// `status IN (...)`, `(status)::text = ANY (...)`, with optional casts and parens.
static CHECK_CHOICES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^[\s(]*"?(?P<column>[\w$]+)"?\s*\)?\s*(?:::\s*[\w ]+?\s*)?(?:IN\s*\(|=\s*ANY\s*\()"#,
    )
    .ok()
});

/// Parses a SQL script with default configuration, deriving the module from the path.
#[must_use]
pub fn parse_sql(text: &str, path: &Utf8Path) -> ParsedSchema {
    let config = CodegenConfig::default();
    let module = module_for_path(path, &config.module_overrides);
    SqlSchemaParser::new(&config).parse(text, path, &module)
}

/// SQL schema parser bound to a code generation configuration.
///
/// The configuration supplies default lengths and precisions for types
/// declared without parameters.
#[derive(Debug, Clone, Copy)]
pub struct SqlSchemaParser<'a> {
    config: &'a CodegenConfig,
}

impl<'a> SqlSchemaParser<'a> {
    /// Creates a parser.
    #[must_use]
    pub const fn new(config: &'a CodegenConfig) -> Self {
        Self { config }
    }

    /// Parses one SQL script.
    ///
    /// Enum types are collected from the whole script first, so a table may
    /// reference an enum declared later in the file.
    #[must_use]
    pub fn parse(&self, text: &str, path: &Utf8Path, module: &str) -> ParsedSchema {
        let cleaned = strip_comments(text);
        let statements = split_statements(&cleaned);

        let mut state = ParseState {
            config: self.config,
            path,
            module,
            enums: FxHashMap::default(),
            tables: Vec::new(),
            diagnostics: Vec::new(),
        };

        for statement in &statements {
            state.collect_enum(statement);
        }
        for statement in &statements {
            state.parse_statement(statement);
        }

        ParsedSchema {
            tables: state.tables,
            diagnostics: state.diagnostics,
        }
    }
}

/// A constraint declared apart from its column.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        reference: ForeignKeyRef,
    },
    Check {
        column: String,
        values: Vec<String>,
    },
}

struct ParseState<'a> {
    config: &'a CodegenConfig,
    path: &'a Utf8Path,
    module: &'a str,
    enums: FxHashMap<String, Vec<String>>,
    tables: Vec<TableDescriptor>,
    diagnostics: Vec<Diagnostic>,
}

impl ParseState<'_> {
    fn diagnose(&mut self, kind: DiagnosticKind, table: Option<&str>, message: impl Into<String>) {
        record(
            &mut self.diagnostics,
            Diagnostic::new(kind, self.path, table, message),
        );
    }

    fn collect_enum(&mut self, statement: &str) {
        let Some(caps) = CREATE_ENUM.as_ref().and_then(|re| re.captures(statement)) else {
            return;
        };
        let (Some(name), Some(whole)) = (caps.name("name"), caps.get(0)) else {
            return;
        };
        let Some((body, _)) = balanced_group(statement, whole.end() - 1) else {
            return;
        };
        self.enums
            .insert(normalize_identifier(name.as_str()), string_literals(body));
    }

    fn parse_statement(&mut self, statement: &str) {
        if let Some(caps) = CREATE_TABLE.as_ref().and_then(|re| re.captures(statement)) {
            if let (Some(name), Some(whole)) = (caps.name("name"), caps.get(0)) {
                let table_name = normalize_identifier(name.as_str());
                match balanced_group(statement, whole.end() - 1) {
                    Some((body, _)) => self.parse_create_table(&table_name, body),
                    None => self.diagnose(
                        DiagnosticKind::SkippedFragment,
                        Some(&table_name),
                        "unterminated CREATE TABLE body",
                    ),
                }
            }
        } else if let Some(caps) = ALTER_TABLE.as_ref().and_then(|re| re.captures(statement)) {
            if let (Some(name), Some(actions)) = (caps.name("name"), caps.name("actions")) {
                self.parse_alter_table(&normalize_identifier(name.as_str()), actions.as_str());
            }
        } else if let Some(caps) = CREATE_UNIQUE_INDEX.as_ref().and_then(|re| re.captures(statement)) {
            if let (Some(name), Some(whole)) = (caps.name("name"), caps.get(0)) {
                let table_name = normalize_identifier(name.as_str());
                if let Some((columns, _)) = balanced_group(statement, whole.end() - 1) {
                    match plain_column_list(columns) {
                        Some(columns) => {
                            self.apply_to_table(&table_name, TableConstraint::Unique(columns));
                        }
                        None => self.diagnose(
                            DiagnosticKind::SkippedFragment,
                            Some(&table_name),
                            "expression unique index",
                        ),
                    }
                }
            }
        }
    }

    fn parse_create_table(&mut self, table_name: &str, body: &str) {
        let mut table = TableDescriptor::new(table_name, self.module, SourceDialect::Sql, self.path);
        let mut constraints = Vec::new();

        for element in split_top_level(body, b',') {
            let tokens = tokenize(element);
            let Some(first) = tokens.first() else {
                continue;
            };

            if TABLE_CONSTRAINT_KEYWORDS.iter().any(|kw| first.is_keyword(kw)) {
                match parse_table_constraint(&tokens) {
                    Some(constraint) => constraints.push(constraint),
                    None => self.diagnose(
                        DiagnosticKind::SkippedFragment,
                        Some(table_name),
                        format!("unsupported table constraint: {element}"),
                    ),
                }
                continue;
            }

            if first.is_keyword("LIKE") {
                self.diagnose(
                    DiagnosticKind::SkippedFragment,
                    Some(table_name),
                    format!("unsupported table element: {element}"),
                );
                continue;
            }

            if let Some((column, inline)) = self.parse_column(element, &tokens, table_name) {
                table.columns.push(column);
                constraints.extend(inline);
            }
        }

        for constraint in constraints {
            self.apply_constraint(&mut table, constraint);
        }

        if self.tables.iter().any(|t| t.table_name == table_name) {
            self.diagnose(
                DiagnosticKind::DroppedTable,
                Some(table_name),
                "table declared twice; keeping the first declaration",
            );
            return;
        }
        self.tables.push(table);
    }

    fn parse_alter_table(&mut self, table_name: &str, actions: &str) {
        for action in split_top_level(actions, b',') {
            let tokens = tokenize(action);
            if !tokens.first().is_some_and(|t| t.is_keyword("ADD")) {
                continue;
            }
            let rest = &tokens[1..];
            let Some(next) = rest.first() else {
                continue;
            };

            if TABLE_CONSTRAINT_KEYWORDS.iter().any(|kw| next.is_keyword(kw)) {
                match parse_table_constraint(rest) {
                    Some(constraint) => self.apply_to_table(table_name, constraint),
                    None => self.diagnose(
                        DiagnosticKind::SkippedFragment,
                        Some(table_name),
                        format!("unsupported ALTER TABLE constraint: {action}"),
                    ),
                }
                continue;
            }

            let mut skip = usize::from(next.is_keyword("COLUMN"));
            if rest.get(skip).is_some_and(|t| t.is_keyword("IF"))
                && rest.get(skip + 1).is_some_and(|t| t.is_keyword("NOT"))
                && rest.get(skip + 2).is_some_and(|t| t.is_keyword("EXISTS"))
            {
                skip += 3;
            }
            let Some(start) = rest.get(skip).map(|t| t.start) else {
                continue;
            };
            let definition = &action[start..];
            let column_tokens = tokenize(definition);

            let Some(index) = self.tables.iter().position(|t| t.table_name == table_name) else {
                self.diagnose(
                    DiagnosticKind::SkippedFragment,
                    Some(table_name),
                    "ALTER TABLE ADD COLUMN on an unknown table",
                );
                continue;
            };
            if let Some((column, inline)) = self.parse_column(definition, &column_tokens, table_name) {
                let mut table = self.tables.remove(index);
                table.columns.push(column);
                for constraint in inline {
                    self.apply_constraint(&mut table, constraint);
                }
                self.tables.insert(index, table);
            }
        }
    }

    fn apply_to_table(&mut self, table_name: &str, constraint: TableConstraint) {
        let Some(index) = self.tables.iter().position(|t| t.table_name == table_name) else {
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                Some(table_name),
                "constraint on an unknown table",
            );
            return;
        };
        let mut table = self.tables.remove(index);
        self.apply_constraint(&mut table, constraint);
        self.tables.insert(index, table);
    }

    fn apply_constraint(&mut self, table: &mut TableDescriptor, constraint: TableConstraint) {
        let missing = |table: &TableDescriptor, columns: &[String]| {
            columns
                .iter()
                .find(|c| table.column(c).is_none())
                .cloned()
        };

        let columns = match &constraint {
            TableConstraint::PrimaryKey(c) | TableConstraint::Unique(c) => c.clone(),
            TableConstraint::ForeignKey { columns, .. } => columns.clone(),
            TableConstraint::Check { column, .. } => vec![column.clone()],
        };
        if let Some(column) = missing(table, &columns) {
            let name = table.table_name.clone();
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                Some(&name),
                format!("constraint references unknown column {column}"),
            );
            return;
        }

        match constraint {
            TableConstraint::PrimaryKey(columns) => {
                if let [single] = columns.as_slice() {
                    if let Some(col) = table.column_mut(single) {
                        col.primary_key = true;
                        col.nullable = false;
                    }
                } else {
                    for name in &columns {
                        if let Some(col) = table.column_mut(name) {
                            col.nullable = false;
                        }
                    }
                    push_unique_group(table, columns);
                }
            }
            TableConstraint::Unique(columns) => {
                if let [single] = columns.as_slice() {
                    if let Some(col) = table.column_mut(single) {
                        col.unique = true;
                    }
                } else {
                    push_unique_group(table, columns);
                }
            }
            TableConstraint::ForeignKey { columns, reference } => {
                if let [single] = columns.as_slice() {
                    if let Some(col) = table.column_mut(single) {
                        col.foreign_key = Some(reference);
                    }
                } else {
                    let name = table.table_name.clone();
                    self.diagnose(
                        DiagnosticKind::SkippedFragment,
                        Some(&name),
                        format!("multi-column foreign key on ({})", columns.join(", ")),
                    );
                }
            }
            TableConstraint::Check { column, values } => {
                if let Some(col) = table.column_mut(&column) {
                    apply_choices(col, values);
                }
            }
        }
    }

    /// Parses one column definition, returning the column and any inline
    /// constraints that must be applied at table level.
    fn parse_column(
        &mut self,
        definition: &str,
        tokens: &[Token],
        table_name: &str,
    ) -> Option<(ColumnDescriptor, Vec<TableConstraint>)> {
        let Some(name) = tokens.first().and_then(Token::identifier) else {
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                Some(table_name),
                format!("unrecognized column definition: {definition}"),
            );
            return None;
        };

        let type_end = tokens
            .iter()
            .skip(1)
            .position(is_clause_keyword)
            .map_or(tokens.len(), |p| p + 1);
        if type_end <= 1 {
            self.diagnose(
                DiagnosticKind::SkippedFragment,
                Some(table_name),
                format!("column {name} has no type"),
            );
            return None;
        }
        let type_text = &definition[tokens[1].start..tokens[type_end - 1].end];
        let mut column = self.resolve_column_type(&name, type_text, table_name);

        let mut inline = Vec::new();
        let mut i = type_end;
        while i < tokens.len() {
            let token = &tokens[i];
            if token.is_keyword("CONSTRAINT") {
                i += 2;
            } else if token.is_keyword("PRIMARY") {
                column.primary_key = true;
                column.nullable = false;
                i += if tokens.get(i + 1).is_some_and(|t| t.is_keyword("KEY")) { 2 } else { 1 };
            } else if token.is_keyword("NOT") {
                if tokens.get(i + 1).is_some_and(|t| t.is_keyword("NULL")) {
                    column.nullable = false;
                    i += 2;
                } else {
                    i += 1;
                }
            } else if token.is_keyword("NULL") {
                column.nullable = true;
                i += 1;
            } else if token.is_keyword("UNIQUE") {
                column.unique = true;
                i += 1;
            } else if token.is_keyword("DEFAULT") {
                let start = i + 1;
                let mut end = start;
                while end < tokens.len() && (end == start || !is_clause_keyword(&tokens[end])) {
                    end += 1;
                }
                if end > start {
                    let raw = &definition[tokens[start].start..tokens[end - 1].end];
                    column.default = Some(normalize_default(raw));
                }
                i = end;
            } else if token.is_keyword("REFERENCES") {
                let (reference, next) = parse_references(tokens, i + 1);
                match reference {
                    Some(reference) => column.foreign_key = Some(reference),
                    None => self.diagnose(
                        DiagnosticKind::SkippedFragment,
                        Some(table_name),
                        format!("unreadable REFERENCES on {name}"),
                    ),
                }
                i = next;
            } else if token.is_keyword("CHECK") {
                if let Some(values) = tokens
                    .get(i + 1)
                    .and_then(Token::group)
                    .and_then(check_choices)
                    .map(|(_, values)| values)
                {
                    inline.push(TableConstraint::Check {
                        column: name.clone(),
                        values,
                    });
                }
                i += 2;
            } else if token.is_keyword("GENERATED") {
                i = parse_generated(tokens, i + 1, &mut column);
            } else if token.is_keyword("COLLATE") {
                i += 2;
            } else {
                i += 1;
            }
        }

        Some((column, inline))
    }

    fn resolve_column_type(&mut self, name: &str, type_text: &str, table_name: &str) -> ColumnDescriptor {
        let sql_type = SqlType::parse(type_text);

        if let Some(values) = self.enums.get(&sql_type.base) {
            let mut column = ColumnDescriptor::new(name, type_text, FieldType::Text);
            column.is_array = sql_type.is_array;
            apply_choices(&mut column, values.clone());
            return column;
        }

        let field_type = map_sql_type(&sql_type, self.config).unwrap_or_else(|| {
            self.diagnose(
                DiagnosticKind::UnknownType,
                Some(table_name),
                format!("column {name}: unknown type {type_text}, using text"),
            );
            FieldType::Text
        });

        let mut column = ColumnDescriptor::new(name, type_text, field_type);
        column.is_array = sql_type.is_array;
        column
    }
}

fn is_clause_keyword(token: &Token) -> bool {
    CLAUSE_KEYWORDS.iter().any(|kw| token.is_keyword(kw))
}

/// Sets the choice list and sizes the column to the longest value.
fn apply_choices(column: &mut ColumnDescriptor, values: Vec<String>) {
    if values.is_empty() {
        return;
    }
    column.choices = Some(values);
    let longest = column.longest_choice().unwrap_or_default();
    column.field_type = FieldType::Char {
        max_length: u32::try_from(longest).unwrap_or(u32::MAX),
    };
}

fn push_unique_group(table: &mut TableDescriptor, columns: Vec<String>) {
    if !table.unique_together.contains(&columns) {
        table.unique_together.push(columns);
    }
}

/// Extracts enumerated values from a CHECK expression.
///
/// Returns the constrained column and its values in declaration order.
fn check_choices(expression: &str) -> Option<(String, Vec<String>)> {
    let caps = CHECK_CHOICES.as_ref()?.captures(expression)?;
    let column = caps.name("column")?.as_str().to_ascii_lowercase();
    let values = string_literals(expression);
    (!values.is_empty()).then_some((column, values))
}

/// Parses a table-level constraint starting at `tokens[0]`.
fn parse_table_constraint(tokens: &[Token]) -> Option<TableConstraint> {
    let mut i = 0;
    if tokens.first()?.is_keyword("CONSTRAINT") {
        i = 2;
    }
    let head = tokens.get(i)?;

    if head.is_keyword("PRIMARY") {
        let group = tokens.get(i + 2)?.group()?;
        return Some(TableConstraint::PrimaryKey(column_list(group)));
    }
    if head.is_keyword("UNIQUE") {
        let group = tokens[i + 1..].iter().find_map(Token::group)?;
        return Some(TableConstraint::Unique(column_list(group)));
    }
    if head.is_keyword("FOREIGN") {
        let group = tokens.get(i + 2)?.group()?;
        let references = tokens.get(i + 3)?;
        if !references.is_keyword("REFERENCES") {
            return None;
        }
        let (reference, _) = parse_references(tokens, i + 4);
        return Some(TableConstraint::ForeignKey {
            columns: column_list(group),
            reference: reference?,
        });
    }
    if head.is_keyword("CHECK") {
        let (column, values) = check_choices(tokens.get(i + 1)?.group()?)?;
        return Some(TableConstraint::Check { column, values });
    }
    None
}

/// Parses `table [(column)] [ON DELETE action] [ON UPDATE action] ...`
/// starting at `tokens[start]`. Returns the reference and the index after it.
fn parse_references(tokens: &[Token], start: usize) -> (Option<ForeignKeyRef>, usize) {
    let Some((table, mut i)) = qualified_name(tokens, start) else {
        return (None, start + 1);
    };

    let mut column = "id".to_owned();
    if let Some(group) = tokens.get(i).and_then(Token::group) {
        if let Some(first) = column_list(group).into_iter().next() {
            column = first;
        }
        i += 1;
    }

    let mut on_delete = None;
    while let Some(token) = tokens.get(i) {
        if token.is_keyword("ON") {
            let is_delete = tokens.get(i + 1).is_some_and(|t| t.is_keyword("DELETE"));
            let width = match tokens.get(i + 2) {
                Some(t) if t.is_keyword("SET") || t.is_keyword("NO") => 2,
                Some(_) => 1,
                None => 0,
            };
            if is_delete {
                if let Some(action) = tokens.get(i + 2..i + 2 + width).filter(|a| !a.is_empty()) {
                    let text: Vec<String> = action.iter().filter_map(Token::identifier).collect();
                    on_delete = OnDelete::parse(&text.join(" "));
                }
            }
            i += 2 + width;
        } else if token.is_keyword("MATCH") || token.is_keyword("INITIALLY") {
            i += 2;
        } else if token.is_keyword("DEFERRABLE") || (token.is_keyword("NOT") && tokens.get(i + 1).is_some_and(|t| t.is_keyword("DEFERRABLE"))) {
            i += if token.is_keyword("NOT") { 2 } else { 1 };
        } else {
            break;
        }
    }

    (
        Some(ForeignKeyRef::new(table, column).with_on_delete(on_delete)),
        i,
    )
}

/// Handles `GENERATED ALWAYS AS (expr) STORED` and `GENERATED ... AS IDENTITY`.
fn parse_generated(tokens: &[Token], start: usize, column: &mut ColumnDescriptor) -> usize {
    let mut i = start;
    while tokens
        .get(i)
        .is_some_and(|t| t.is_keyword("ALWAYS") || t.is_keyword("BY") || t.is_keyword("DEFAULT"))
    {
        i += 1;
    }
    if tokens.get(i).is_some_and(|t| t.is_keyword("AS")) {
        i += 1;
    }

    if tokens.get(i).is_some_and(|t| t.is_keyword("IDENTITY")) {
        column.nullable = false;
        i += 1;
        if tokens.get(i).and_then(Token::group).is_some() {
            i += 1;
        }
        return i;
    }

    if let Some(expression) = tokens.get(i).and_then(Token::group) {
        column.generated = true;
        if expression.to_ascii_lowercase().contains("tsvector") {
            column.field_type = FieldType::SearchVector;
        }
        i += 1;
    }
    if tokens.get(i).is_some_and(|t| t.is_keyword("STORED") || t.is_keyword("VIRTUAL")) {
        i += 1;
    }
    i
}

/// Reads `name` or `schema.name` starting at `start`, returning the last
/// segment and the index after the name.
fn qualified_name(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let mut name = tokens.get(start)?.identifier()?;
    let mut i = start + 1;
    while tokens.get(i).is_some_and(|t| t.is_punct('.')) {
        match tokens.get(i + 1).and_then(Token::identifier) {
            Some(segment) => {
                name = segment;
                i += 2;
            }
            None => break,
        }
    }
    Some((name, i))
}

/// Normalizes a possibly qualified, possibly quoted name to its last segment.
fn normalize_identifier(raw: &str) -> String {
    let tokens = tokenize(raw);
    tokens
        .iter()
        .rev()
        .find_map(Token::identifier)
        .unwrap_or_else(|| raw.trim().to_ascii_lowercase())
}

/// Splits a parenthesized column list into names, ignoring sort options.
fn column_list(group: &str) -> Vec<String> {
    split_top_level(group, b',')
        .into_iter()
        .filter_map(|item| tokenize(item).first().and_then(Token::identifier))
        .collect()
}

/// Like [`column_list`], but `None` if any entry is an expression.
fn plain_column_list(group: &str) -> Option<Vec<String>> {
    split_top_level(group, b',')
        .into_iter()
        .map(|item| {
            let tokens = tokenize(item);
            let first = tokens.first()?;
            let plain = matches!(first.kind, TokenKind::Word(_) | TokenKind::Ident(_))
                && tokens[1..].iter().all(|t| {
                    t.is_keyword("ASC") || t.is_keyword("DESC") || t.is_keyword("NULLS")
                        || t.is_keyword("FIRST") || t.is_keyword("LAST")
                });
            if plain { first.identifier() } else { None }
        })
        .collect()
}

/// Strips wrapping parentheses and trailing `::type` casts from a default.
///
/// `('open'::character varying)` becomes `'open'`; `now()` is unchanged.
fn normalize_default(raw: &str) -> String {
    let mut text = raw.trim();
    loop {
        if text.starts_with('(') {
            if let Some((inner, end)) = balanced_group(text, 0) {
                if end == text.len() {
                    text = inner.trim();
                    continue;
                }
            }
        }
        if let Some(pos) = find_top_level(text, "::") {
            text = text[..pos].trim();
            continue;
        }
        break;
    }
    text.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> ParsedSchema {
        parse_sql(sql, Utf8Path::new("members.sql"))
    }

    #[test]
    fn test_regexes_compile() {
        assert!(CREATE_TABLE.is_some());
        assert!(CREATE_ENUM.is_some());
        assert!(ALTER_TABLE.is_some());
        assert!(CREATE_UNIQUE_INDEX.is_some());
        assert!(CHECK_CHOICES.is_some());
    }

    #[test]
    fn test_nested_parens_do_not_split_columns() {
        let parsed = parse(
            "CREATE TABLE payments (
                amount NUMERIC(12,2) NOT NULL,
                fee DECIMAL(5, 3),
                note TEXT
            );",
        );
        let table = &parsed.tables[0];
        assert_eq!(table.columns.len(), 3);
        assert_eq!(
            table.columns[0].field_type,
            FieldType::Decimal {
                max_digits: 12,
                decimal_places: 2
            }
        );
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[0].source_type, "NUMERIC(12,2)");
    }

    #[test]
    fn test_inline_clauses() {
        let parsed = parse(
            "CREATE TABLE IF NOT EXISTS public.members (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email VARCHAR(320) NOT NULL UNIQUE,
                status VARCHAR(20) DEFAULT 'active'::character varying NOT NULL,
                organization_id UUID REFERENCES organizations(id) ON DELETE CASCADE,
                mentor_id UUID REFERENCES members ON DELETE SET NULL,
                joined_at TIMESTAMP WITH TIME ZONE DEFAULT now()
            );",
        );
        let table = &parsed.tables[0];
        assert_eq!(table.table_name, "members");

        let id = table.column("id").unwrap();
        assert!(id.primary_key);
        assert_eq!(id.default.as_deref(), Some("gen_random_uuid()"));

        let email = table.column("email").unwrap();
        assert!(email.unique);
        assert!(!email.nullable);

        let status = table.column("status").unwrap();
        assert_eq!(status.default.as_deref(), Some("'active'"));
        assert!(!status.nullable);

        let org = table.column("organization_id").unwrap();
        let fk = org.foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "organizations");
        assert_eq!(fk.column, "id");
        assert_eq!(fk.on_delete, Some(OnDelete::Cascade));

        let mentor = table.column("mentor_id").unwrap();
        let fk = mentor.foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "members");
        assert_eq!(fk.on_delete, Some(OnDelete::SetNull));

        assert_eq!(table.column("joined_at").unwrap().field_type, FieldType::DateTime);
    }

    #[test]
    fn test_check_in_choices_order_preserved() {
        let parsed = parse(
            "CREATE TABLE grievances (
                priority TEXT CHECK (priority IN ('low', 'medium', 'critical')),
                stage VARCHAR(50)
            );",
        );
        let col = parsed.tables[0].column("priority").unwrap();
        assert_eq!(
            col.choices.as_deref(),
            Some(&["low".to_owned(), "medium".to_owned(), "critical".to_owned()][..])
        );
        assert_eq!(col.field_type, FieldType::Char { max_length: 8 });
    }

    #[test]
    fn test_pg_dump_any_array_check() {
        let parsed = parse(
            "CREATE TABLE public.claims (
                status character varying(20) NOT NULL,
                CONSTRAINT claims_status_check CHECK (((status)::text = ANY ((ARRAY['open'::character varying, 'closed'::character varying])::text[])))
            );",
        );
        let col = parsed.tables[0].column("status").unwrap();
        assert_eq!(
            col.choices.as_deref(),
            Some(&["open".to_owned(), "closed".to_owned()][..])
        );
    }

    #[test]
    fn test_table_level_constraints() {
        let parsed = parse(
            "CREATE TABLE memberships (
                id UUID,
                member_id UUID NOT NULL,
                unit_id UUID NOT NULL,
                code TEXT,
                PRIMARY KEY (id),
                UNIQUE (member_id, unit_id),
                CONSTRAINT fk_unit FOREIGN KEY (unit_id) REFERENCES units (id) ON DELETE RESTRICT,
                UNIQUE (code)
            );",
        );
        let table = &parsed.tables[0];
        assert!(table.column("id").unwrap().primary_key);
        assert_eq!(table.unique_together, vec![vec!["member_id".to_owned(), "unit_id".to_owned()]]);
        let fk = table.column("unit_id").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "units");
        assert_eq!(fk.on_delete, Some(OnDelete::Restrict));
        assert!(table.column("code").unwrap().unique);
    }

    #[test]
    fn test_enum_type_resolution() {
        let parsed = parse(
            "CREATE TABLE cases (state case_state NOT NULL);
             CREATE TYPE public.case_state AS ENUM ('new', 'assigned', 'resolved');",
        );
        let col = parsed.tables[0].column("state").unwrap();
        assert_eq!(col.choices.as_ref().map(Vec::len), Some(3));
        assert_eq!(col.field_type, FieldType::Char { max_length: 8 });
    }

    #[test]
    fn test_alter_table_add_constraint() {
        let parsed = parse(
            "CREATE TABLE public.dues (id uuid NOT NULL, member_id uuid);
             ALTER TABLE ONLY public.dues ADD CONSTRAINT dues_pkey PRIMARY KEY (id);
             ALTER TABLE ONLY public.dues
                 ADD CONSTRAINT dues_member_fk FOREIGN KEY (member_id) REFERENCES public.members(id) ON DELETE CASCADE;
             ALTER TABLE dues ADD COLUMN IF NOT EXISTS paid_at timestamptz;",
        );
        let table = &parsed.tables[0];
        assert!(table.column("id").unwrap().primary_key);
        let fk = table.column("member_id").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "members");
        assert_eq!(fk.on_delete, Some(OnDelete::Cascade));
        assert_eq!(table.column("paid_at").unwrap().field_type, FieldType::DateTime);
    }

    #[test]
    fn test_generated_search_vector_and_identity() {
        let parsed = parse(
            "CREATE TABLE documents (
                seq BIGINT GENERATED ALWAYS AS IDENTITY,
                title TEXT,
                search_vector tsvector GENERATED ALWAYS AS (to_tsvector('english', coalesce(title, ''))) STORED
            );",
        );
        let table = &parsed.tables[0];
        assert_eq!(table.columns.len(), 3);
        let seq = table.column("seq").unwrap();
        assert!(!seq.generated);
        assert!(!seq.nullable);
        let sv = table.column("search_vector").unwrap();
        assert!(sv.generated);
        assert!(sv.is_search_vector());
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let parsed = parse("CREATE TABLE places (location geography(Point, 4326));");
        let col = parsed.tables[0].column("location").unwrap();
        assert_eq!(col.field_type, FieldType::Text);
        assert_eq!(parsed.count(DiagnosticKind::UnknownType), 1);
    }

    #[test]
    fn test_comments_and_other_statements_ignored() {
        let parsed = parse(
            "-- members table
             SET search_path = public;
             /* main table */
             CREATE TABLE notes (body TEXT); -- trailing
             CREATE INDEX notes_body_idx ON notes (body);
             INSERT INTO notes VALUES ('x; y');",
        );
        assert_eq!(parsed.tables.len(), 1);
        assert_eq!(parsed.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_unique_index_applies_group() {
        let parsed = parse(
            "CREATE TABLE seats (unit TEXT, number INT);
             CREATE UNIQUE INDEX seats_unit_number ON public.seats USING btree (unit, number);
             CREATE UNIQUE INDEX seats_lower ON seats (lower(unit));",
        );
        assert_eq!(
            parsed.tables[0].unique_together,
            vec![vec!["unit".to_owned(), "number".to_owned()]]
        );
        assert_eq!(parsed.count(DiagnosticKind::SkippedFragment), 1);
    }

    #[test]
    fn test_array_columns() {
        let parsed = parse("CREATE TABLE tags (labels TEXT[] NOT NULL DEFAULT '{}');");
        let col = parsed.tables[0].column("labels").unwrap();
        assert!(col.is_array);
        assert_eq!(col.field_type, FieldType::Text);
        assert_eq!(col.default.as_deref(), Some("'{}'"));
    }

    #[test]
    fn test_normalize_default() {
        assert_eq!(normalize_default("('open'::text)"), "'open'");
        assert_eq!(normalize_default("nextval('s'::regclass)"), "nextval('s'::regclass)");
        assert_eq!(normalize_default("'{}'::jsonb"), "'{}'");
        assert_eq!(normalize_default("0"), "0");
    }

    #[test]
    fn test_truncated_on_delete_degrades() {
        let parsed = parse(
            "CREATE TABLE claims (id UUID, member_id UUID REFERENCES members(id) ON DELETE SET);",
        );
        let fk = parsed.tables[0].column("member_id").and_then(|c| c.foreign_key.clone());
        assert_eq!(fk.map(|f| (f.table, f.on_delete)), Some(("members".to_owned(), None)));

        let parsed = parse(
            "CREATE TABLE claims (id UUID, member_id UUID, FOREIGN KEY (member_id) REFERENCES members ON DELETE NO);",
        );
        let fk = parsed.tables[0].column("member_id").and_then(|c| c.foreign_key.clone());
        assert_eq!(fk.map(|f| (f.table, f.column, f.on_delete)), Some(("members".to_owned(), "id".to_owned(), None)));
    }

    #[test]
    fn test_duplicate_table_keeps_first() {
        let parsed = parse(
            "CREATE TABLE notes (title TEXT);
             CREATE TABLE notes (body TEXT, extra TEXT);",
        );
        assert_eq!(parsed.tables.len(), 1);
        assert!(parsed.tables[0].column("title").is_some());
        assert!(parsed.tables[0].column("body").is_none());
        assert_eq!(parsed.count(DiagnosticKind::DroppedTable), 1);
    }

    #[test]
    fn test_quoted_identifiers_keep_case() {
        let parsed = parse(r#"CREATE TABLE "AuditLog" ("userId" UUID, Action TEXT);"#);
        let table = &parsed.tables[0];
        assert_eq!(table.table_name, "AuditLog");
        assert!(table.column("userId").is_some());
        assert!(table.column("action").is_some());
    }
}
