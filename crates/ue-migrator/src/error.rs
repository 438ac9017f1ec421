//! Error types for the ue-migrator crate.

use camino::Utf8PathBuf;

/// Which side of the migration a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The database rows are read from.
    Source,
    /// The database rows are written to.
    Target,
}

impl Side {
    /// Returns the lowercase side label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while migrating.
///
/// # Error Recovery Strategy
///
/// - **Connection errors** ([`MigrateError::Connect`], [`MigrateError::ConnectTimeout`]):
///   fatal, the run never starts
/// - **Checkpoint errors** ([`MigrateError::Checkpoint`], [`MigrateError::CheckpointFormat`]):
///   fatal, progress could not be recorded
/// - **Query errors** ([`MigrateError::Database`], [`MigrateError::Table`]):
///   recorded against the table being migrated; the run continues
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Could not connect to a database.
    #[error("failed to connect to {side} database: {source}")]
    Connect {
        /// Which connection failed.
        side: Side,
        /// The driver error.
        #[source]
        source: sqlx::Error,
    },

    /// Connecting took longer than the configured timeout.
    #[error("timed out after {seconds}s connecting to {side} database")]
    ConnectTimeout {
        /// Which connection timed out.
        side: Side,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// A query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A table-level problem found before or during copying.
    #[error("table {table}: {message}")]
    Table {
        /// The table being migrated.
        table: String,
        /// What went wrong.
        message: String,
    },

    /// The checkpoint file could not be read or written.
    #[error("checkpoint {path}: {source}")]
    Checkpoint {
        /// The checkpoint path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint file is not valid JSON.
    #[error("invalid checkpoint {path}: {source}")]
    CheckpointFormat {
        /// The checkpoint path.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl MigrateError {
    /// Creates a new [`MigrateError::Table`] error.
    #[inline]
    pub fn table(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Table {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a new [`MigrateError::Checkpoint`] error.
    #[inline]
    pub fn checkpoint(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Checkpoint {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error only affects the current table.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Table { .. })
    }

    /// Returns `true` if the run should stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_error_is_recoverable() {
        let err = MigrateError::table("claims", "no columns in common");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "table claims: no columns in common");
    }

    #[test]
    fn test_connect_errors_are_fatal() {
        let err = MigrateError::ConnectTimeout {
            side: Side::Target,
            seconds: 30,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "timed out after 30s connecting to target database");

        let err = MigrateError::checkpoint(
            ".migration/ue.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_fatal());
    }
}
