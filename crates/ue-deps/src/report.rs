//! Dependency reports in JSON and Markdown.

use std::fmt::Write as _;

use camino::Utf8Path;
use serde::Serialize;
use ue_core::{PackageCategory, PackageInfo, RiskTier};

use crate::error::DepsError;

/// Packages in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// The category.
    pub category: PackageCategory,
    /// Number of packages.
    pub count: usize,
    /// Package names, sorted.
    pub packages: Vec<String>,
}

/// The complete classification result.
///
/// # Examples
///
/// ```
/// use ue_core::{PackageCategory, PackageInfo, RiskThresholds};
/// use ue_deps::DependencyReport;
///
/// let mut orm = PackageInfo::new("drizzle-orm", "^0.30.0", false);
/// orm.category = PackageCategory::Migrate;
/// orm.apply_usage(42, &RiskThresholds::default());
/// let ui = PackageInfo::new("vitest", "^1.0.0", true);
///
/// let report = DependencyReport::build(vec![ui, orm]);
/// assert_eq!(report.total_packages, 2);
/// assert_eq!(report.development, 1);
/// assert_eq!(report.high_risk, vec!["drizzle-orm"]);
/// assert_eq!(report.packages[0].name, "drizzle-orm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Number of distinct packages.
    pub total_packages: usize,
    /// Production packages.
    pub production: usize,
    /// Development packages.
    pub development: usize,
    /// Non-empty categories in report order.
    pub summary: Vec<CategorySummary>,
    /// High-risk packages, most used first.
    pub high_risk: Vec<String>,
    /// Every package, sorted by name.
    pub packages: Vec<PackageInfo>,
}

impl DependencyReport {
    /// Builds a report from classified packages.
    #[must_use]
    pub fn build(mut packages: Vec<PackageInfo>) -> Self {
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        let summary = PackageCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let names: Vec<String> = packages
                    .iter()
                    .filter(|p| p.category == category)
                    .map(|p| p.name.clone())
                    .collect();
                (!names.is_empty()).then(|| CategorySummary {
                    category,
                    count: names.len(),
                    packages: names,
                })
            })
            .collect();

        let mut high: Vec<&PackageInfo> = packages
            .iter()
            .filter(|p| p.risk == Some(RiskTier::High))
            .collect();
        high.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then_with(|| a.name.cmp(&b.name)));
        let high_risk = high.into_iter().map(|p| p.name.clone()).collect();

        let development = packages.iter().filter(|p| p.dev).count();
        Self {
            total_packages: packages.len(),
            production: packages.len() - development,
            development,
            summary,
            high_risk,
            packages,
        }
    }

    /// Number of packages in a category.
    #[must_use]
    pub fn count(&self, category: PackageCategory) -> usize {
        self.summary
            .iter()
            .find(|s| s.category == category)
            .map_or(0, |s| s.count)
    }

    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DepsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON report to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Write`] if the file cannot be written.
    pub fn write_json(&self, path: &Utf8Path) -> Result<(), DepsError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| DepsError::write(path, source))
    }

    /// Writes the Markdown report to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Write`] if the file cannot be written.
    pub fn write_markdown(&self, path: &Utf8Path) -> Result<(), DepsError> {
        std::fs::write(path, render_markdown(self)).map_err(|source| DepsError::write(path, source))
    }
}

fn cell(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Renders the report as Markdown.
///
/// Sections: totals, a category summary table, the high-risk list, then one
/// table per non-empty category.
#[must_use]
pub fn render_markdown(report: &DependencyReport) -> String {
    let mut out = String::new();

    out.push_str("# Dependency Migration Report\n\n");
    let _ = writeln!(
        out,
        "- Total packages: {} ({} production, {} development)",
        report.total_packages, report.production, report.development
    );
    let _ = writeln!(out, "- High risk: {}\n", report.high_risk.len());

    out.push_str("## Summary\n\n| Category | Packages |\n|----------|----------|\n");
    for summary in &report.summary {
        let _ = writeln!(out, "| {} | {} |", summary.category.as_str(), summary.count);
    }

    if !report.high_risk.is_empty() {
        out.push_str("\n## High Risk\n\n| Package | Category | Files | Target |\n|---------|----------|-------|--------|\n");
        for name in &report.high_risk {
            if let Some(pkg) = report.packages.iter().find(|p| &p.name == name) {
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {} | {} |",
                    pkg.name,
                    pkg.category.as_str(),
                    pkg.usage_count,
                    cell(pkg.migration_target.as_deref())
                );
            }
        }
    }

    for summary in &report.summary {
        let _ = write!(
            out,
            "\n## {}\n\n| Package | Version | Dev | Files | Risk | Target | Equivalent |\n|---------|---------|-----|-------|------|--------|------------|\n",
            summary.category.as_str()
        );
        for pkg in report.packages.iter().filter(|p| p.category == summary.category) {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {} | {} | {} | {} |",
                pkg.name,
                pkg.version,
                if pkg.dev { "yes" } else { "no" },
                pkg.usage_count,
                cell(pkg.risk.map(RiskTier::as_str)),
                cell(pkg.migration_target.as_deref()),
                cell(pkg.equivalent.as_deref())
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use ue_core::RiskThresholds;

    use super::*;

    fn sample() -> DependencyReport {
        let thresholds = RiskThresholds::default();

        let mut orm = PackageInfo::new("drizzle-orm", "^0.30.0", false);
        orm.category = PackageCategory::Migrate;
        orm.migration_target = Some("django-orm".to_owned());
        orm.equivalent = Some("Django ORM models and querysets".to_owned());
        orm.apply_usage(42, &thresholds);

        let mut kit = PackageInfo::new("drizzle-kit", "^0.20.0", true);
        kit.category = PackageCategory::Remove;
        kit.migration_target = Some("django-migrations".to_owned());
        kit.apply_usage(1, &thresholds);

        let mut react = PackageInfo::new("react", "18.2.0", false);
        react.category = PackageCategory::FrontendOnly;
        react.apply_usage(250, &thresholds);

        DependencyReport::build(vec![react, orm, kit])
    }

    #[test]
    fn test_build_counts() {
        let report = sample();
        assert_eq!(report.total_packages, 3);
        assert_eq!(report.production, 2);
        assert_eq!(report.development, 1);
        assert_eq!(report.count(PackageCategory::Migrate), 1);
        assert_eq!(report.count(PackageCategory::Keep), 0);
        assert_eq!(report.high_risk, vec!["drizzle-orm"]);
        let order: Vec<_> = report.summary.iter().map(|s| s.category).collect();
        assert_eq!(
            order,
            vec![PackageCategory::FrontendOnly, PackageCategory::Remove, PackageCategory::Migrate]
        );
    }

    #[test]
    fn test_high_risk_sorted_by_usage() {
        let thresholds = RiskThresholds::default();
        let packages = [("axios", 25), ("zod", 90), ("lodash", 90)]
            .into_iter()
            .map(|(name, uses)| {
                let mut p = PackageInfo::new(name, "1", false);
                p.category = PackageCategory::Migrate;
                p.apply_usage(uses, &thresholds);
                p
            })
            .collect();
        let report = DependencyReport::build(packages);
        assert_eq!(report.high_risk, vec!["lodash", "zod", "axios"]);
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_packages"], 3);
        assert_eq!(value["summary"][0]["category"], "frontend-only");
        assert_eq!(value["packages"][0]["name"], "drizzle-kit");
        assert_eq!(value["packages"][0]["risk"], "low");
        assert!(value["packages"][2]["risk"].is_null());
    }

    #[test]
    fn test_render_markdown() {
        let markdown = render_markdown(&sample());
        assert_snapshot!(markdown.trim_end(), @r"
        # Dependency Migration Report

        - Total packages: 3 (2 production, 1 development)
        - High risk: 1

        ## Summary

        | Category | Packages |
        |----------|----------|
        | frontend-only | 1 |
        | remove | 1 |
        | migrate | 1 |

        ## High Risk

        | Package | Category | Files | Target |
        |---------|----------|-------|--------|
        | `drizzle-orm` | migrate | 42 | django-orm |

        ## frontend-only

        | Package | Version | Dev | Files | Risk | Target | Equivalent |
        |---------|---------|-----|-------|------|--------|------------|
        | `react` | 18.2.0 | no | 250 | - | - | - |

        ## remove

        | Package | Version | Dev | Files | Risk | Target | Equivalent |
        |---------|---------|-----|-------|------|--------|------------|
        | `drizzle-kit` | ^0.20.0 | yes | 1 | low | django-migrations | - |

        ## migrate

        | Package | Version | Dev | Files | Risk | Target | Equivalent |
        |---------|---------|-----|-------|------|--------|------------|
        | `drizzle-orm` | ^0.30.0 | no | 42 | high | django-orm | Django ORM models and querysets |
        ");
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let report = sample();
        report.write_json(&root.join("deps.json")).unwrap();
        report.write_markdown(&root.join("deps.md")).unwrap();
        assert!(std::fs::read_to_string(root.join("deps.md")).unwrap().starts_with("# Dependency"));
    }
}
