//! Row-count validation between source and target.

use serde::Serialize;

/// Row counts of one table on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    /// Table name.
    pub table: String,
    /// Rows in the source.
    pub source: u64,
    /// Rows in the target.
    pub target: u64,
}

impl TableCount {
    /// Returns `true` when both sides hold the same number of rows.
    #[inline]
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.source == self.target
    }
}

/// The result of a validation run.
///
/// # Examples
///
/// ```
/// use ue_migrator::{TableCount, ValidationReport};
///
/// let report = ValidationReport {
///     tables: vec![
///         TableCount { table: "members".to_owned(), source: 10, target: 10 },
///         TableCount { table: "claims".to_owned(), source: 4, target: 3 },
///     ],
/// };
/// assert!(!report.all_green());
/// assert_eq!(report.mismatches().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Per-table counts in load order.
    pub tables: Vec<TableCount>,
}

impl ValidationReport {
    /// Tables whose counts differ.
    pub fn mismatches(&self) -> impl Iterator<Item = &TableCount> {
        self.tables.iter().filter(|t| !t.matches())
    }

    /// Returns `true` if every table matches.
    #[must_use]
    pub fn all_green(&self) -> bool {
        self.tables.iter().all(TableCount::matches)
    }

    /// Formats the per-table lines and the final verdict.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let width = self
            .tables
            .iter()
            .map(|t| t.table.len())
            .max()
            .unwrap_or(0)
            .max("table".len());

        let mut lines = Vec::with_capacity(self.tables.len() + 2);
        lines.push(format!("{:<width$}  {:>10}  {:>10}  status", "table", "source", "target"));
        for t in &self.tables {
            lines.push(format!(
                "{:<width$}  {:>10}  {:>10}  {}",
                t.table,
                t.source,
                t.target,
                if t.matches() { "OK" } else { "MISMATCH" }
            ));
        }
        let mismatched = self.mismatches().count();
        lines.push(if mismatched == 0 {
            "ALL GREEN".to_owned()
        } else {
            format!("{mismatched} of {} tables mismatched", self.tables.len())
        });
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(table: &str, source: u64, target: u64) -> TableCount {
        TableCount {
            table: table.to_owned(),
            source,
            target,
        }
    }

    #[test]
    fn test_lines_all_green() {
        let report = ValidationReport {
            tables: vec![count("organizations", 2, 2), count("members", 40, 40)],
        };
        assert_eq!(
            report.lines(),
            vec![
                "table              source      target  status",
                "organizations           2           2  OK",
                "members                40          40  OK",
                "ALL GREEN",
            ]
        );
    }

    #[test]
    fn test_lines_mismatch_summary() {
        let report = ValidationReport {
            tables: vec![count("a", 1, 0), count("b", 1, 1)],
        };
        let lines = report.lines();
        assert!(lines[1].ends_with("MISMATCH"));
        assert_eq!(lines.last().map(String::as_str), Some("1 of 2 tables mismatched"));
    }

    #[test]
    fn test_empty_report_is_green() {
        assert!(ValidationReport::default().all_green());
    }
}
