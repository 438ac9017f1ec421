//! Third-party package classification records.
//!
//! A [`PackageInfo`] is created when a manifest is read, filled in by the
//! classification pass, and given a [`RiskTier`] by the usage pass. It is not
//! changed after a report is built.

use serde::{Deserialize, Serialize};

/// The migration bucket a package falls into.
///
/// # Examples
///
/// ```
/// use ue_core::PackageCategory;
///
/// assert!(PackageCategory::Remove.carries_risk());
/// assert!(PackageCategory::Migrate.carries_risk());
/// assert!(!PackageCategory::FrontendOnly.carries_risk());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageCategory {
    /// Infrastructure shared by every product (storage, caching, telemetry).
    SharedInfrastructure,
    /// Functionality specific to one product.
    ProductSpecific,
    /// Used only by the browser bundle; unaffected by the backend port.
    FrontendOnly,
    /// Dropped entirely; the target platform covers it natively.
    Remove,
    /// Replaced by a target-platform equivalent.
    Migrate,
    /// Kept as-is (a client SDK exists for the target platform).
    Keep,
    /// Unknown production package; evaluate manually.
    NeedsEvaluation,
    /// Unknown development-only package.
    DevOnly,
}

impl PackageCategory {
    /// All categories in report order.
    pub const ALL: [Self; 8] = [
        Self::SharedInfrastructure,
        Self::ProductSpecific,
        Self::FrontendOnly,
        Self::Remove,
        Self::Migrate,
        Self::Keep,
        Self::NeedsEvaluation,
        Self::DevOnly,
    ];

    /// Returns `true` for categories whose usage count drives a risk tier.
    #[inline]
    #[must_use]
    pub const fn carries_risk(self) -> bool {
        matches!(self, Self::Remove | Self::Migrate)
    }

    /// Returns the kebab-case tag used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SharedInfrastructure => "shared-infrastructure",
            Self::ProductSpecific => "product-specific",
            Self::FrontendOnly => "frontend-only",
            Self::Remove => "remove",
            Self::Migrate => "migrate",
            Self::Keep => "keep",
            Self::NeedsEvaluation => "needs-evaluation",
            Self::DevOnly => "dev-only",
        }
    }
}

/// Usage thresholds separating risk tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Usage counts strictly above this are [`RiskTier::High`].
    pub high_above: usize,
    /// Usage counts at or above this (and not high) are [`RiskTier::Medium`].
    pub medium_from: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_above: 20,
            medium_from: 6,
        }
    }
}

/// How disruptive replacing a package will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Referenced by few files.
    Low,
    /// Referenced by a moderate number of files.
    Medium,
    /// Referenced widely.
    High,
}

impl RiskTier {
    /// Derives a tier from the number of files referencing a package.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_core::{RiskThresholds, RiskTier};
    ///
    /// let t = RiskThresholds::default();
    /// assert_eq!(RiskTier::from_usage(21, &t), RiskTier::High);
    /// assert_eq!(RiskTier::from_usage(20, &t), RiskTier::Medium);
    /// assert_eq!(RiskTier::from_usage(6, &t), RiskTier::Medium);
    /// assert_eq!(RiskTier::from_usage(5, &t), RiskTier::Low);
    /// ```
    #[must_use]
    pub const fn from_usage(count: usize, thresholds: &RiskThresholds) -> Self {
        if count > thresholds.high_above {
            Self::High
        } else if count >= thresholds.medium_from {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the lowercase tier label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A classification entry: the static table and configured overrides share this shape.
///
/// For prefix rules, `pattern` is a package-name prefix such as `@radix-ui/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRule {
    /// Exact package name, or prefix for prefix rules.
    pub pattern: String,
    /// Assigned category.
    pub category: PackageCategory,
    /// Target-platform replacement tag.
    #[serde(default)]
    pub migration_target: Option<String>,
    /// Human description of the equivalent library.
    #[serde(default)]
    pub equivalent: Option<String>,
}

/// One third-party package and everything the classifier learned about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name (`@clerk/nextjs`).
    pub name: String,
    /// Version range from the manifest.
    pub version: String,
    /// Declared under development dependencies.
    pub dev: bool,
    /// Assigned category.
    pub category: PackageCategory,
    /// Target-platform replacement tag.
    pub migration_target: Option<String>,
    /// Human description of the equivalent library.
    pub equivalent: Option<String>,
    /// Risk tier; only set for [`PackageCategory::carries_risk`] categories.
    pub risk: Option<RiskTier>,
    /// Number of source files referencing the package.
    pub usage_count: usize,
}

impl PackageInfo {
    /// Creates an unclassified record, defaulting the category by the dev flag.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, dev: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dev,
            category: if dev {
                PackageCategory::DevOnly
            } else {
                PackageCategory::NeedsEvaluation
            },
            migration_target: None,
            equivalent: None,
            risk: None,
            usage_count: 0,
        }
    }

    /// Records the usage count and derives the risk tier.
    ///
    /// The tier is only set for categories that carry risk; every other
    /// package keeps `None` no matter how widely it is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_core::{PackageCategory, PackageInfo, RiskThresholds, RiskTier};
    ///
    /// let mut pkg = PackageInfo::new("@radix-ui/react-dialog", "^1.0.0", false);
    /// pkg.category = PackageCategory::FrontendOnly;
    /// pkg.apply_usage(500, &RiskThresholds::default());
    /// assert_eq!(pkg.risk, None);
    ///
    /// pkg.category = PackageCategory::Migrate;
    /// pkg.apply_usage(500, &RiskThresholds::default());
    /// assert_eq!(pkg.risk, Some(RiskTier::High));
    /// ```
    pub fn apply_usage(&mut self, count: usize, thresholds: &RiskThresholds) {
        self.usage_count = count;
        self.risk = self
            .category
            .carries_risk()
            .then(|| RiskTier::from_usage(count, thresholds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_by_dev_flag() {
        assert_eq!(
            PackageInfo::new("left-pad", "1.0.0", false).category,
            PackageCategory::NeedsEvaluation
        );
        assert_eq!(
            PackageInfo::new("prettier", "3.0.0", true).category,
            PackageCategory::DevOnly
        );
    }

    #[test]
    fn test_risk_only_for_remove_and_migrate() {
        let thresholds = RiskThresholds::default();
        for category in PackageCategory::ALL {
            let mut pkg = PackageInfo::new("pkg", "1", false);
            pkg.category = category;
            pkg.apply_usage(100, &thresholds);
            assert_eq!(pkg.risk.is_some(), category.carries_risk(), "{category:?}");
            assert_eq!(pkg.usage_count, 100);
        }
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_string(&PackageCategory::SharedInfrastructure).unwrap(),
            r#""shared-infrastructure""#
        );
        assert_eq!(
            serde_json::to_string(&PackageCategory::NeedsEvaluation).unwrap(),
            r#""needs-evaluation""#
        );
        for category in PackageCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json.trim_matches('"'), category.as_str());
        }
    }
}
