//! Schema file discovery and batch parsing.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::{debug, info};
use ue_core::CodegenConfig;

use crate::diagnostics::{record, Diagnostic, DiagnosticKind, ParsedSchema};
use crate::drizzle::DrizzleSchema;
use crate::error::SchemaError;
use crate::module::module_for_path;
use crate::sql::SqlSchemaParser;

/// Directories never searched for schema files.
const SKIP_DIRECTORIES: &[&str] = &["node_modules", "dist", "build", ".git", ".next", ".turbo", "migrations"];

/// Which parser a schema file goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaKind {
    Sql,
    Drizzle,
}

impl SchemaKind {
    fn for_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()? {
            "sql" => Some(Self::Sql),
            "ts" | "mts" | "cts" | "tsx" | "js" | "mjs" => Some(Self::Drizzle),
            _ => None,
        }
    }
}

/// Parses every schema file under `paths`.
///
/// Files are parsed directly; directories are searched recursively for
/// `.sql` and TypeScript files, honoring `.gitignore`. SQL files are parsed
/// one at a time. Drizzle files are parsed as one batch so references can
/// cross files. The combined result is passed through
/// [`finalize_tables`](crate::finalize_tables).
///
/// # Errors
///
/// Returns [`SchemaError::Read`] for an unreadable file,
/// [`SchemaError::Walk`] if a directory cannot be traversed, and
/// [`SchemaError::Parser`] if the TypeScript grammar cannot be loaded.
pub fn parse_schema_files(paths: &[Utf8PathBuf], config: &CodegenConfig) -> Result<ParsedSchema, SchemaError> {
    let mut schema = ParsedSchema::default();
    let mut drizzle_sources = Vec::new();
    let sql = SqlSchemaParser::new(config);

    for path in collect_schema_paths(paths, &mut schema.diagnostics)? {
        let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::read(&path, source))?;
        match SchemaKind::for_path(&path) {
            Some(SchemaKind::Sql) => {
                let module = module_for_path(&path, &config.module_overrides);
                debug!(path = %path, module = %module, "parsing sql schema");
                schema.merge(sql.parse(&text, &path, &module));
            }
            Some(SchemaKind::Drizzle) => drizzle_sources.push((path, text)),
            None => {}
        }
    }

    if !drizzle_sources.is_empty() {
        debug!(files = drizzle_sources.len(), "parsing drizzle schemas");
        schema.merge(DrizzleSchema::new(config).parse_sources(&drizzle_sources)?);
    }

    let schema = schema.finalize();
    info!(
        tables = schema.tables.len(),
        diagnostics = schema.diagnostics.len(),
        "schema parsing complete"
    );
    Ok(schema)
}

/// Expands directories and drops unsupported files, keeping input order.
fn collect_schema_paths(
    paths: &[Utf8PathBuf],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Utf8PathBuf>, SchemaError> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = walk_directory(path)?;
            found.sort();
            out.extend(found);
        } else if SchemaKind::for_path(path).is_some() {
            out.push(path.clone());
        } else {
            record(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::SkippedFragment,
                    path.clone(),
                    None,
                    "unsupported schema file extension",
                ),
            );
        }
    }
    Ok(out)
}

fn walk_directory(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SchemaError> {
    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .require_git(false)
        .threads(1)
        .build();

    let mut paths = Vec::new();
    for result in walker {
        let entry = result?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = Utf8Path::from_path(entry.path())
            .ok_or_else(|| SchemaError::NonUtf8Path(entry.path().to_owned()))?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        if relative
            .components()
            .any(|c| SKIP_DIRECTORIES.contains(&c.as_str()))
        {
            continue;
        }
        if SchemaKind::for_path(path).is_some() {
            paths.push(path.to_owned());
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_owned()).unwrap()
    }

    #[test]
    fn test_schema_kind_for_path() {
        assert_eq!(SchemaKind::for_path(Utf8Path::new("a.sql")), Some(SchemaKind::Sql));
        assert_eq!(SchemaKind::for_path(Utf8Path::new("a.ts")), Some(SchemaKind::Drizzle));
        assert_eq!(SchemaKind::for_path(Utf8Path::new("a.md")), None);
    }

    #[test]
    fn test_parse_mixed_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        std::fs::write(
            root.join("members.sql"),
            "CREATE TABLE members (id UUID PRIMARY KEY, name TEXT NOT NULL);",
        )
        .unwrap();
        std::fs::write(
            root.join("claims-schema.ts"),
            "export const claims = pgTable('claims', { id: uuid('id').primaryKey(), memberId: uuid('member_id') });",
        )
        .unwrap();
        std::fs::write(root.join("README.md"), "# schemas").unwrap();
        std::fs::create_dir(root.join("node_modules")).unwrap();
        std::fs::write(
            root.join("node_modules").join("vendor.sql"),
            "CREATE TABLE vendor (id INT);",
        )
        .unwrap();

        let schema = parse_schema_files(&[root], &CodegenConfig::default()).unwrap();
        let names: Vec<_> = schema.tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["members", "claims"]);
        assert_eq!(schema.table("members").unwrap().module, "members");
        assert_eq!(schema.table("claims").unwrap().module, "claims");
    }

    #[test]
    fn test_explicit_unsupported_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(&dir.path().join("notes.txt"));
        std::fs::write(&path, "nothing").unwrap();

        let schema = parse_schema_files(&[path], &CodegenConfig::default()).unwrap();
        assert!(schema.tables.is_empty());
        assert_eq!(schema.count(DiagnosticKind::SkippedFragment), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = parse_schema_files(
            &[Utf8PathBuf::from("/definitely/not/here.sql")],
            &CodegenConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }
}
