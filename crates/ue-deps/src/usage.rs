//! Source usage scanning and risk tiering.
//!
//! Each source file is parsed with tree-sitter and its module specifiers
//! (`import`, `export ... from`, `require()`, dynamic `import()`) are reduced
//! to package names. A package's usage count is the number of distinct files
//! referencing it; several imports in one file count once.

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use ue_core::{DepsConfig, FxHashMap, FxHashSet, PackageInfo, RiskThresholds};
use ue_ts_parser::{Grammar, ParseError, TsParser};

use crate::error::DepsError;
use crate::stats::{StatsSnapshot, UsageStats};
use crate::walker::FileWalker;

/// Files referencing each package, keyed by package name.
pub type UsageCounts = FxHashMap<String, usize>;

/// Counts package references across a set of source files.
#[derive(Debug)]
pub struct UsageScanner {
    paths: Vec<Utf8PathBuf>,
    stats: UsageStats,
}

impl UsageScanner {
    /// Creates a scanner over an explicit file list.
    #[must_use]
    pub fn new(paths: Vec<Utf8PathBuf>) -> Self {
        Self {
            paths,
            stats: UsageStats::new(),
        }
    }

    /// Creates a scanner over every configured source file under `root`.
    ///
    /// # Errors
    ///
    /// Returns the walker's errors (missing root, traversal failure).
    pub fn discover(root: &Utf8Path, config: &DepsConfig) -> Result<Self, DepsError> {
        let paths = FileWalker::new(root)?
            .with_skip_dirs(config.skip_dirs.as_slice())
            .with_extensions(config.source_extensions.as_slice())
            .collect_sources()?;
        debug!(root = %root, files = paths.len(), "Collected source files");
        Ok(Self::new(paths))
    }

    /// The files this scanner reads.
    #[must_use]
    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.paths
    }

    /// Counts, for each package, the files that reference it.
    ///
    /// Files are processed in parallel with one pair of parsers per worker
    /// thread. Unreadable or unparsable files are logged, counted in
    /// [`stats`](Self::stats), and skipped. Only names in `packages` are
    /// counted; a package never referenced has no entry.
    pub fn count_usage(&self, packages: &[PackageInfo]) -> UsageCounts {
        let wanted: FxHashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();

        let per_file: Vec<Vec<String>> = self
            .paths
            .par_iter()
            .map_init(
                || (TsParser::new().ok(), TsParser::new_tsx().ok()),
                |(ts, tsx), path| {
                    let parser = match Grammar::for_path(path) {
                        Grammar::TypeScript => ts.as_mut(),
                        Grammar::Tsx => tsx.as_mut(),
                    };
                    match scan_file(path, parser, &wanted) {
                        Ok(found) => {
                            self.stats.record_file(found.len() as u64);
                            found
                        }
                        Err(err) => {
                            warn!(path = %path, error = %err, "Skipping file in usage scan");
                            self.stats.increment_errors();
                            Vec::new()
                        }
                    }
                },
            )
            .collect();

        let mut counts = UsageCounts::default();
        for name in per_file.into_iter().flatten() {
            *counts.entry(name).or_insert(0) += 1;
        }

        let snap = self.stats.snapshot();
        info!(
            files = snap.files,
            errors = snap.errors,
            packages = counts.len(),
            "Usage scan complete"
        );
        counts
    }

    /// Statistics from the last scan.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Returns the distinct wanted packages a file references.
fn scan_file(
    path: &Utf8Path,
    parser: Option<&mut TsParser>,
    wanted: &FxHashSet<&str>,
) -> Result<Vec<String>, DepsError> {
    let source = std::fs::read_to_string(path).map_err(|source| DepsError::read(path, source))?;
    let parser = parser.ok_or_else(|| DepsError::parse(path, ParseError::LanguageInit))?;
    let specifiers = parser
        .module_specifiers(&source)
        .map_err(|source| DepsError::parse(path, source))?;

    let mut found: Vec<String> = specifiers
        .iter()
        .filter_map(|s| s.package_name())
        .filter(|name| wanted.contains(name))
        .map(str::to_owned)
        .collect();
    found.sort_unstable();
    found.dedup();
    Ok(found)
}

/// Stores each package's usage count and derives its risk tier.
///
/// Only `remove` and `migrate` packages receive a tier; see
/// [`PackageInfo::apply_usage`].
///
/// # Examples
///
/// ```
/// use ue_core::{PackageCategory, PackageInfo, RiskThresholds, RiskTier};
/// use ue_deps::{apply_risk, UsageCounts};
///
/// let mut packages = vec![PackageInfo::new("axios", "^1.6.0", false)];
/// packages[0].category = PackageCategory::Migrate;
///
/// let mut counts = UsageCounts::default();
/// counts.insert("axios".to_owned(), 21);
///
/// apply_risk(&mut packages, &counts, &RiskThresholds::default());
/// assert_eq!(packages[0].usage_count, 21);
/// assert_eq!(packages[0].risk, Some(RiskTier::High));
/// ```
pub fn apply_risk(packages: &mut [PackageInfo], counts: &UsageCounts, thresholds: &RiskThresholds) {
    for package in packages.iter_mut() {
        let count = counts.get(&package.name).copied().unwrap_or(0);
        package.apply_usage(count, thresholds);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ue_core::{PackageCategory, RiskTier};

    use super::*;

    fn write(root: &Utf8Path, rel: &str, text: &str) -> Utf8PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    fn packages(names: &[&str]) -> Vec<PackageInfo> {
        names.iter().map(|n| PackageInfo::new(*n, "1.0.0", false)).collect()
    }

    #[test]
    fn test_count_usage_counts_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write(
            &root,
            "lib/db.ts",
            "import { pgTable } from 'drizzle-orm/pg-core';\nimport { eq } from 'drizzle-orm';\n",
        );
        write(
            &root,
            "app/page.tsx",
            "import { auth } from '@clerk/nextjs/server';\nimport { db } from '@/lib/db';\nexport default function Page() { return <div />; }\n",
        );
        write(&root, "scripts/seed.js", "const { drizzle } = require('drizzle-orm/node-postgres');\n");
        write(&root, "node_modules/drizzle-orm/index.js", "export * from 'drizzle-orm';\n");

        let scanner = UsageScanner::discover(&root, &DepsConfig::default()).unwrap();
        assert_eq!(scanner.paths().len(), 3);

        let counts = scanner.count_usage(&packages(&["drizzle-orm", "@clerk/nextjs", "zod"]));
        assert_eq!(counts.get("drizzle-orm"), Some(&2));
        assert_eq!(counts.get("@clerk/nextjs"), Some(&1));
        assert_eq!(counts.get("zod"), None);

        let snap = scanner.stats();
        assert_eq!(snap.files, 3);
        assert_eq!(snap.errors, 0);
    }

    #[test]
    fn test_missing_file_counted_as_error() {
        let scanner = UsageScanner::new(vec![Utf8PathBuf::from("/definitely/not/here.ts")]);
        let counts = scanner.count_usage(&packages(&["react"]));
        assert!(counts.is_empty());
        assert_eq!(scanner.stats().errors, 1);
    }

    #[test]
    fn test_apply_risk_only_for_remove_and_migrate() {
        let mut list = packages(&["react", "drizzle-kit", "zod", "lodash"]);
        list[0].category = PackageCategory::FrontendOnly;
        list[1].category = PackageCategory::Remove;
        list[2].category = PackageCategory::Migrate;
        list[3].category = PackageCategory::Remove;

        let mut counts = UsageCounts::default();
        counts.insert("react".to_owned(), 300);
        counts.insert("drizzle-kit".to_owned(), 6);
        counts.insert("zod".to_owned(), 20);

        apply_risk(&mut list, &counts, &RiskThresholds::default());
        assert_eq!(list[0].risk, None);
        assert_eq!(list[0].usage_count, 300);
        assert_eq!(list[1].risk, Some(RiskTier::Medium));
        assert_eq!(list[2].risk, Some(RiskTier::Medium));
        assert_eq!(list[3].risk, Some(RiskTier::Low));
        assert_eq!(list[3].usage_count, 0);
    }
}
