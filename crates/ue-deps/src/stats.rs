//! Usage-scan statistics with atomic counters.
//!
//! Counters use [`Relaxed`](std::sync::atomic::Ordering::Relaxed) ordering;
//! they are informational and read only after the scan finishes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters updated by scanner threads.
#[derive(Debug, Default)]
pub struct UsageStats {
    files: AtomicU64,
    files_with_packages: AtomicU64,
    specifiers: AtomicU64,
    errors: AtomicU64,
}

impl UsageStats {
    /// Creates a new set of counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one scanned file and the package specifiers it contained.
    #[inline]
    pub fn record_file(&self, specifiers: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.specifiers.fetch_add(specifiers, Ordering::Relaxed);
        if specifiers > 0 {
            self.files_with_packages.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Increments the error counter.
    #[inline]
    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files: self.files.load(Ordering::Relaxed),
            files_with_packages: self.files_with_packages.load(Ordering::Relaxed),
            specifiers: self.specifiers.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A copy of [`UsageStats`] at one moment.
///
/// # Examples
///
/// ```
/// use ue_deps::UsageStats;
///
/// let stats = UsageStats::new();
/// stats.record_file(3);
/// stats.record_file(0);
/// stats.increment_errors();
///
/// let snap = stats.snapshot();
/// assert_eq!(snap.files, 2);
/// assert_eq!(snap.files_with_packages, 1);
/// assert_eq!(snap.attempted(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files read and parsed.
    pub files: u64,
    /// Files referencing at least one package.
    pub files_with_packages: u64,
    /// Package specifiers seen across all files.
    pub specifiers: u64,
    /// Files that could not be read or parsed.
    pub errors: u64,
}

impl StatsSnapshot {
    /// Files scanned plus files that failed.
    #[inline]
    #[must_use]
    pub const fn attempted(&self) -> u64 {
        self.files + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        assert_eq!(UsageStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_record_file_counts_specifiers() {
        let stats = UsageStats::new();
        stats.record_file(2);
        stats.record_file(5);
        let snap = stats.snapshot();
        assert_eq!(snap.specifiers, 7);
        assert_eq!(snap.files_with_packages, 2);
        assert_eq!(snap.errors, 0);
    }
}
