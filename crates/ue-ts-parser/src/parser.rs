//! TypeScript parser management using tree-sitter.
//!
//! This module provides the [`TsParser`] struct and the [`Grammar`] selector
//! that picks the TypeScript or TSX grammar for a file.

use camino::Utf8Path;
use smallvec::SmallVec;
use tree_sitter::{Language, Parser, Query, Tree};

use crate::drizzle::{extract_drizzle, DrizzleModule};
use crate::error::ParseError;
use crate::queries::{tsx_specifier_query, typescript_specifier_query};
use crate::specifiers::{extract_module_specifiers, ModuleSpecifier};

/// The tree-sitter grammar used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`).
    TypeScript,
    /// TypeScript with JSX. Also used for JavaScript files, which may contain JSX.
    Tsx,
}

impl Grammar {
    /// Picks the grammar for a file by extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use ue_ts_parser::Grammar;
    ///
    /// assert_eq!(Grammar::for_path(Utf8Path::new("db/schema.ts")), Grammar::TypeScript);
    /// assert_eq!(Grammar::for_path(Utf8Path::new("app/page.tsx")), Grammar::Tsx);
    /// assert_eq!(Grammar::for_path(Utf8Path::new("next.config.js")), Grammar::Tsx);
    /// ```
    #[must_use]
    pub fn for_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            _ => Self::Tsx,
        }
    }

    fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn specifier_query(self) -> Result<&'static Query, ParseError> {
        match self {
            Self::TypeScript => typescript_specifier_query(),
            Self::Tsx => tsx_specifier_query(),
        }
    }
}

/// TypeScript parser for Drizzle schemas and module references.
///
/// Wraps a tree-sitter parser configured for one [`Grammar`]. The parser can
/// be reused across files.
///
/// # Thread Safety
///
/// `TsParser` is `Send` but not `Sync`. For parallel scanning with rayon,
/// create one parser per worker (for example with `map_init`). The compiled
/// queries are shared by all parsers.
///
/// # Examples
///
/// ```
/// use ue_ts_parser::TsParser;
///
/// let mut parser = TsParser::new()?;
/// let module = parser.drizzle("export const t = pgTable('t', { name: text('name') });")?;
/// assert_eq!(module.tables[0].name, "t");
/// # Ok::<(), ue_ts_parser::ParseError>(())
/// ```
pub struct TsParser {
    parser: Parser,
    grammar: Grammar,
}

impl TsParser {
    /// Creates a parser for plain TypeScript.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn new() -> Result<Self, ParseError> {
        Self::with_grammar(Grammar::TypeScript)
    }

    /// Creates a parser for TSX.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn new_tsx() -> Result<Self, ParseError> {
        Self::with_grammar(Grammar::Tsx)
    }

    /// Creates a parser for the given grammar.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn with_grammar(grammar: Grammar) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|_| ParseError::LanguageInit)?;
        Ok(Self { parser, grammar })
    }

    /// Returns the grammar this parser was created with.
    #[inline]
    #[must_use]
    pub const fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Parses source into a syntax tree.
    ///
    /// Syntax errors do not fail the parse; tree-sitter recovers and the
    /// extractors skip the damaged regions.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Parse`] if tree-sitter produces no tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser.parse(source, None).ok_or(ParseError::Parse)
    }

    /// Parses source and returns every module specifier it references.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Parse`] if parsing fails and
    /// [`ParseError::QueryCompile`] if the query fails to compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_ts_parser::TsParser;
    ///
    /// let mut parser = TsParser::new()?;
    /// let found = parser.module_specifiers("import Stripe from 'stripe';")?;
    /// assert_eq!(found[0].package_name(), Some("stripe"));
    /// # Ok::<(), ue_ts_parser::ParseError>(())
    /// ```
    pub fn module_specifiers(
        &mut self,
        source: &str,
    ) -> Result<SmallVec<[ModuleSpecifier; 8]>, ParseError> {
        let tree = self.parse(source)?;
        let query = self.grammar.specifier_query()?;
        Ok(extract_module_specifiers(&tree, source, query))
    }

    /// Parses source and returns its Drizzle table and enum declarations.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Parse`] if parsing fails.
    pub fn drizzle(&mut self, source: &str) -> Result<DrizzleModule, ParseError> {
        let tree = self.parse(source)?;
        Ok(extract_drizzle(&tree, source))
    }
}

impl std::fmt::Debug for TsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsParser")
            .field("grammar", &self.grammar)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_creation() {
        assert_eq!(TsParser::new().unwrap().grammar(), Grammar::TypeScript);
        assert_eq!(TsParser::new_tsx().unwrap().grammar(), Grammar::Tsx);
    }

    #[test]
    fn test_tsx_parser_handles_jsx() {
        let mut parser = TsParser::new_tsx().unwrap();
        let source = r"
import { Button } from '@radix-ui/react-slot';
export default function Page() { return <Button>Save</Button>; }
";
        let found = parser.module_specifiers(source).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package_name(), Some("@radix-ui/react-slot"));
    }

    #[test]
    fn test_parser_reuse() {
        let mut parser = TsParser::new().unwrap();
        for _ in 0..3 {
            let found = parser.module_specifiers("import { z } from 'zod';").unwrap();
            assert_eq!(found.len(), 1);
        }
    }

    #[test]
    fn test_broken_source_still_parses() {
        let mut parser = TsParser::new().unwrap();
        let found = parser
            .module_specifiers("import { a } from 'pg';\nconst = = ;\n")
            .unwrap();
        assert_eq!(found[0].specifier, "pg");
    }

    #[test]
    fn test_debug_impl() {
        let parser = TsParser::new().unwrap();
        assert!(format!("{parser:?}").contains("TypeScript"));
    }
}
