//! # ue-deps
//!
//! Third-party package classification for the Union Eyes backend port.
//!
//! The pipeline runs in four passes:
//!
//! 1. **Discover** every `package.json` under a root ([`FileWalker`]) and merge
//!    their dependency sections ([`merge_packages`]).
//! 2. **Classify** each package against the built-in tables and configured
//!    rules ([`Classifier`]).
//! 3. **Count usage**: the number of source files whose imports reference
//!    each package ([`UsageScanner`]), scanned in parallel with tree-sitter.
//! 4. **Tier risk** for `remove` and `migrate` packages ([`apply_risk`]) and
//!    build a [`DependencyReport`].
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use ue_core::{DepsConfig, PackageCategory};
//! use ue_deps::{merge_packages, Classifier, DependencyReport, PackageManifest};
//!
//! let manifest = PackageManifest::parse(
//!     r#"{"dependencies": {"drizzle-orm": "^0.30.0", "@radix-ui/react-slot": "^1.0.2"}}"#,
//!     Utf8Path::new("package.json"),
//! )?;
//!
//! let config = DepsConfig::default();
//! let mut packages = merge_packages([&manifest]);
//! Classifier::new(&config).classify(&mut packages);
//!
//! let report = DependencyReport::build(packages);
//! assert_eq!(report.count(PackageCategory::Migrate), 1);
//! assert_eq!(report.count(PackageCategory::FrontendOnly), 1);
//! # Ok::<(), ue_deps::DepsError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod classifier;
mod error;
mod manifest;
mod report;
pub mod rules;
mod stats;
mod usage;
mod walker;

use camino::Utf8Path;
use tracing::info;
use ue_core::DepsConfig;

pub use classifier::{Classification, Classifier, RuleSource};
pub use error::DepsError;
pub use manifest::{load_manifests, merge_packages, PackageManifest};
pub use report::{render_markdown, CategorySummary, DependencyReport};
pub use stats::{StatsSnapshot, UsageStats};
pub use usage::{apply_risk, UsageCounts, UsageScanner};
pub use walker::{FileWalker, MANIFEST_FILE};

/// Runs every pass over a project root and returns the report.
///
/// # Errors
///
/// Returns [`DepsError::Config`] if the root is missing or contains no
/// readable manifest, and [`DepsError::Walk`] if traversal fails.
pub fn analyze(root: &Utf8Path, config: &DepsConfig) -> Result<DependencyReport, DepsError> {
    let manifest_paths = FileWalker::new(root)?
        .with_skip_dirs(config.skip_dirs.as_slice())
        .collect_manifests()?;
    let manifests = load_manifests(&manifest_paths);
    if manifests.is_empty() {
        return Err(DepsError::config(format!("no readable {MANIFEST_FILE} under {root}")));
    }

    let mut packages = merge_packages(manifests.iter().map(|(_, m)| m));
    Classifier::new(config).classify(&mut packages);

    let scanner = UsageScanner::discover(root, config)?;
    let counts = scanner.count_usage(&packages);
    apply_risk(&mut packages, &counts, &config.risk);

    let report = DependencyReport::build(packages);
    info!(
        manifests = manifests.len(),
        packages = report.total_packages,
        high_risk = report.high_risk.len(),
        "Dependency analysis complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use ue_core::{PackageCategory, RiskTier};

    use super::*;

    #[test]
    fn test_analyze_monorepo() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("apps/web/src")).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{"devDependencies": {"typescript": "^5.4.0", "husky": "^9.0.0"}}"#,
        )
        .unwrap();
        fs::write(
            root.join("apps/web/package.json"),
            r#"{"dependencies": {"zod": "^3.22.0", "react": "18.2.0"}}"#,
        )
        .unwrap();
        for i in 0..7 {
            fs::write(
                root.join(format!("apps/web/src/form{i}.ts")),
                "import { z } from 'zod';\n",
            )
            .unwrap();
        }

        let report = analyze(&root, &DepsConfig::default()).unwrap();
        assert_eq!(report.total_packages, 4);
        assert_eq!(report.development, 2);

        let zod = report.packages.iter().find(|p| p.name == "zod").unwrap();
        assert_eq!(zod.category, PackageCategory::Migrate);
        assert_eq!(zod.usage_count, 7);
        assert_eq!(zod.risk, Some(RiskTier::Medium));

        let husky = report.packages.iter().find(|p| p.name == "husky").unwrap();
        assert_eq!(husky.category, PackageCategory::DevOnly);
        assert_eq!(husky.risk, None);
    }

    #[test]
    fn test_analyze_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let err = analyze(&root, &DepsConfig::default()).unwrap_err();
        assert!(matches!(err, DepsError::Config(_)));
    }
}
