//! Parse diagnostics and the combined parse result.
//!
//! Schema parsing is lenient: a fragment that cannot be understood is
//! skipped and recorded here instead of failing the parse.

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, warn};
use ue_core::TableDescriptor;

/// What kind of leniency a diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A type the mappers do not know; the column fell back to text.
    UnknownType,
    /// A fragment that was skipped (unrecognized clause, malformed field).
    SkippedFragment,
    /// A foreign-key target guessed from a variable name.
    InferredReference,
    /// A table without any parsed columns, or a duplicate declaration.
    DroppedTable,
}

impl DiagnosticKind {
    /// Returns the snake_case tag used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownType => "unknown_type",
            Self::SkippedFragment => "skipped_fragment",
            Self::InferredReference => "inferred_reference",
            Self::DroppedTable => "dropped_table",
        }
    }
}

/// One recorded leniency event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Kind of event.
    pub kind: DiagnosticKind,
    /// File being parsed.
    pub path: Utf8PathBuf,
    /// Table being parsed, if known.
    pub table: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(
        kind: DiagnosticKind,
        path: impl Into<Utf8PathBuf>,
        table: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            table: table.map(str::to_owned),
            message: message.into(),
        }
    }
}

/// Logs a diagnostic and appends it.
///
/// Inferred references are logged at `warn` because they may point at the
/// wrong table; everything else is routine leniency and logged at `debug`.
pub(crate) fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    let table = diagnostic.table.as_deref().unwrap_or("-");
    match diagnostic.kind {
        DiagnosticKind::InferredReference => warn!(
            path = %diagnostic.path,
            table,
            "{}",
            diagnostic.message
        ),
        kind => debug!(
            path = %diagnostic.path,
            table,
            kind = kind.as_str(),
            "{}",
            diagnostic.message
        ),
    }
    diagnostics.push(diagnostic);
}

/// Tables parsed from one or more files, plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSchema {
    /// Parsed tables in declaration order.
    pub tables: Vec<TableDescriptor>,
    /// Leniency events in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedSchema {
    /// Appends another result.
    pub fn merge(&mut self, other: Self) {
        self.tables.extend(other.tables);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Counts diagnostics of one kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.table_name == name)
    }
}
