//! Error types for the ue-codegen crate.

use camino::Utf8PathBuf;

/// Errors that can occur while writing generated sources.
///
/// Rendering itself cannot fail; only the filesystem side does.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Failed to create an output directory or write a file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the generation report.
    #[error("failed to serialize generation report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CodegenError {
    /// Creates a new [`CodegenError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_display() {
        let err = CodegenError::write(
            "out/claims/models.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out/claims/models.py"));
    }
}
