//! Pre-compiled tree-sitter queries for module specifier extraction.
//!
//! This module provides the [`SPECIFIER_QUERY`] constant and lazily compiled,
//! per-grammar caches of it.

use std::sync::OnceLock;

use tree_sitter::{Language, Query};

use crate::error::ParseError;

/// Tree-sitter query matching every way a file can name another module.
///
/// # Capture Names
///
/// - `specifier.import` - `import ... from 'x'` and `import 'x'`
/// - `specifier.export` - `export ... from 'x'`
/// - `specifier.dynamic` - `import('x')`
/// - `require.callee` - the `require` identifier (filtered by predicate)
/// - `specifier.require` - `require('x')`
pub const SPECIFIER_QUERY: &str = r#"
; Static imports, including side-effect imports
(import_statement
  source: (string) @specifier.import)

; Re-exports: export { Foo } from '...' and export * from '...'
(export_statement
  source: (string) @specifier.export)

; Dynamic imports: import('./path') or await import('./path')
(call_expression
  function: (import)
  arguments: (arguments
    (string) @specifier.dynamic))

; CommonJS: require('pkg')
(call_expression
  function: (identifier) @require.callee
  arguments: (arguments
    .
    (string) @specifier.require)
  (#eq? @require.callee "require"))
"#;

/// Capture index for `specifier.import`.
pub const CAPTURE_SPECIFIER_IMPORT: u32 = 0;

/// Capture index for `specifier.export`.
pub const CAPTURE_SPECIFIER_EXPORT: u32 = 1;

/// Capture index for `specifier.dynamic`.
pub const CAPTURE_SPECIFIER_DYNAMIC: u32 = 2;

/// Capture index for `require.callee`.
pub const CAPTURE_REQUIRE_CALLEE: u32 = 3;

/// Capture index for `specifier.require`.
pub const CAPTURE_SPECIFIER_REQUIRE: u32 = 4;

static COMPILED_QUERY_TS: OnceLock<Query> = OnceLock::new();

static COMPILED_QUERY_TSX: OnceLock<Query> = OnceLock::new();

/// Returns the compiled specifier query for TypeScript.
///
/// The query is compiled once and cached for all subsequent calls.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn typescript_specifier_query() -> Result<&'static Query, ParseError> {
    if let Some(query) = COMPILED_QUERY_TS.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY_TS.get_or_init(|| query))
}

/// Returns the compiled specifier query for TSX.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn tsx_specifier_query() -> Result<&'static Query, ParseError> {
    if let Some(query) = COMPILED_QUERY_TSX.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY_TSX.get_or_init(|| query))
}

fn compile_query(language: &Language) -> Result<Query, ParseError> {
    Query::new(language, SPECIFIER_QUERY).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        message: e.message,
    })
}
