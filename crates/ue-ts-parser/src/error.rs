//! Error types for the ue-ts-parser crate.
//!
//! This module provides the [`ParseError`] type for failures that prevent a
//! source file from being parsed at all. Unrecognized constructs inside a
//! successfully parsed file are not errors; extractors skip them.

/// Errors that can occur during TypeScript parsing.
///
/// # Examples
///
/// ```
/// use ue_ts_parser::ParseError;
///
/// fn describe(err: &ParseError) -> &'static str {
///     match err {
///         ParseError::LanguageInit => "grammar",
///         ParseError::QueryCompile { .. } => "query",
///         ParseError::Parse => "parse",
///     }
/// }
///
/// assert_eq!(describe(&ParseError::Parse), "parse");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the TypeScript language on the parser.
    #[error("failed to set TypeScript language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {message}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The tree-sitter error message.
        message: String,
    },

    /// The parser produced no tree (cancelled or out of memory).
    #[error("failed to parse source code")]
    Parse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_init_display() {
        assert_eq!(
            ParseError::LanguageInit.to_string(),
            "failed to set TypeScript language"
        );
    }

    #[test]
    fn test_query_compile_display() {
        let err = ParseError::QueryCompile {
            offset: 12,
            message: "invalid node type".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("invalid node type"));
    }
}
