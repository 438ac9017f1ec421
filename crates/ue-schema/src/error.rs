//! Error types for the ue-schema crate.
//!
//! Malformed schema text is never an error here: it becomes a
//! [`Diagnostic`](crate::Diagnostic). [`SchemaError`] covers the failures that
//! prevent a file from being read or a parser from being created.

use camino::Utf8PathBuf;

/// Errors that can occur while loading schema files.
///
/// # Error Recovery Strategy
///
/// - **Read errors** ([`SchemaError::Read`]): the named file is unusable; the
///   caller decides whether to continue with the rest
/// - **Walk errors** ([`SchemaError::Walk`]): fatal for the directory
/// - **Parser errors** ([`SchemaError::Parser`]): fatal, the grammar could not load
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Failed to read a schema file.
    #[error("failed to read schema file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to walk a schema directory.
    #[error("failed to walk schema directory: {0}")]
    Walk(#[from] ignore::Error),

    /// The TypeScript parser could not be created.
    #[error("failed to initialize TypeScript parser: {0}")]
    Parser(#[from] ue_ts_parser::ParseError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl SchemaError {
    /// Creates a new [`SchemaError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error only affects one file.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::NonUtf8Path(_))
    }

    /// Returns `true` if loading should stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}
