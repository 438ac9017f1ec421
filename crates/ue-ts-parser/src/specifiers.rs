//! Module specifier extraction from parsed sources.
//!
//! Every string a file uses to name another module is collected, whether it
//! appears in an `import`, a re-export, a dynamic `import()`, or `require()`.

use smallvec::SmallVec;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor, Tree};

use crate::node::{node_line, node_text, unquote};
use crate::queries::{
    CAPTURE_SPECIFIER_DYNAMIC, CAPTURE_SPECIFIER_EXPORT, CAPTURE_SPECIFIER_IMPORT,
    CAPTURE_SPECIFIER_REQUIRE,
};

/// How a module specifier was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierKind {
    /// `import ... from 'x'` or `import 'x'`.
    Import,
    /// `export ... from 'x'`.
    Export,
    /// `import('x')`.
    Dynamic,
    /// `require('x')`.
    Require,
}

/// One module reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpecifier {
    /// The specifier with quotes removed (`@clerk/nextjs/server`, `./utils`).
    pub specifier: String,
    /// How the module was referenced.
    pub kind: SpecifierKind,
    /// 1-based line number.
    pub line: usize,
}

impl ModuleSpecifier {
    /// Returns `true` for relative and absolute paths.
    #[inline]
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with('.') || self.specifier.starts_with('/')
    }

    /// Returns the npm package a bare specifier resolves to.
    ///
    /// Relative paths, URL-style specifiers (`node:fs`), and path aliases
    /// (`@/lib/db`, `~/utils`) return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_ts_parser::{ModuleSpecifier, SpecifierKind};
    ///
    /// let spec = |s: &str| ModuleSpecifier {
    ///     specifier: s.to_owned(),
    ///     kind: SpecifierKind::Import,
    ///     line: 1,
    /// };
    ///
    /// assert_eq!(spec("@clerk/nextjs/server").package_name(), Some("@clerk/nextjs"));
    /// assert_eq!(spec("drizzle-orm/pg-core").package_name(), Some("drizzle-orm"));
    /// assert_eq!(spec("react").package_name(), Some("react"));
    /// assert_eq!(spec("./db").package_name(), None);
    /// assert_eq!(spec("@/lib/db").package_name(), None);
    /// assert_eq!(spec("node:fs").package_name(), None);
    /// ```
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        let spec = self.specifier.as_str();
        if spec.is_empty() || self.is_relative() || spec.starts_with('~') || spec.contains(':') {
            return None;
        }

        if let Some(scoped) = spec.strip_prefix('@') {
            let mut parts = scoped.splitn(3, '/');
            let scope = parts.next().filter(|s| !s.is_empty())?;
            let name = parts.next().filter(|s| !s.is_empty())?;
            return Some(&spec[..scope.len() + name.len() + 2]);
        }

        spec.split('/').next()
    }
}

/// Extracts every module specifier from a parsed tree, in source order.
///
/// # Arguments
///
/// * `tree` - The parsed syntax tree
/// * `source` - The original source code
/// * `query` - The pre-compiled specifier query
pub fn extract_module_specifiers(
    tree: &Tree,
    source: &str,
    query: &Query,
) -> SmallVec<[ModuleSpecifier; 8]> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());
    let mut specifiers: SmallVec<[ModuleSpecifier; 8]> = SmallVec::new();

    while let Some(match_) = matches.next() {
        for capture in match_.captures {
            let kind = match capture.index {
                CAPTURE_SPECIFIER_IMPORT => SpecifierKind::Import,
                CAPTURE_SPECIFIER_EXPORT => SpecifierKind::Export,
                CAPTURE_SPECIFIER_DYNAMIC => SpecifierKind::Dynamic,
                CAPTURE_SPECIFIER_REQUIRE => SpecifierKind::Require,
                _ => continue,
            };
            specifiers.push(ModuleSpecifier {
                specifier: unquote(node_text(capture.node, source)),
                kind,
                line: node_line(capture.node),
            });
        }
    }

    specifiers.sort_by_key(|s| s.line);
    specifiers
}
