//! Error types for the ue-deps crate.

use camino::Utf8PathBuf;

/// Errors that can occur while reading manifests or scanning sources.
///
/// # Error Recovery Strategy
///
/// - **Walker errors** ([`DepsError::Walk`]): fatal, propagate immediately
/// - **Manifest errors** ([`DepsError::Manifest`]): skip that manifest
/// - **File read errors** ([`DepsError::Read`]): skip the file, keep scanning
/// - **Parse errors** ([`DepsError::Parse`]): skip the file, keep scanning
#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `package.json` is not valid JSON or has an unexpected shape.
    #[error("invalid manifest {path}: {source}")]
    Manifest {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse a source file.
    #[error("failed to parse file {path}: {source}")]
    Parse {
        /// The path of the file that couldn't be parsed.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: ue_ts_parser::ParseError,
    },

    /// Failed to write a report.
    #[error("failed to write report {path}: {source}")]
    Write {
        /// The report path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a report.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl DepsError {
    /// Creates a new [`DepsError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DepsError::Manifest`] error.
    #[inline]
    pub fn manifest(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Manifest {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DepsError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: ue_ts_parser::ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DepsError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DepsError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if the error only affects one file.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Manifest { .. } | Self::Parse { .. }
        )
    }

    /// Returns `true` if the run should stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. }
            | Self::Manifest { path, .. }
            | Self::Parse { path, .. }
            | Self::Write { path, .. } => Some(path),
            Self::Walk(_) | Self::Serialize(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_read_is_recoverable() {
        let err = DepsError::read("src/app.ts", io::Error::new(io::ErrorKind::NotFound, "not found"));
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("src/app.ts"));
    }

    #[test]
    fn test_manifest_is_recoverable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DepsError::manifest("package.json", source);
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("package.json"));
    }

    #[test]
    fn test_config_is_fatal() {
        let err = DepsError::config("root does not exist");
        assert!(err.is_fatal());
        assert!(err.path().is_none());
        assert_eq!(err.to_string(), "invalid configuration: root does not exist");
    }
}
