//! Package classification.

use tracing::debug;
use ue_core::{DepsConfig, PackageCategory, PackageInfo, PackageRule};

use crate::rules::{known_package, prefix_rule, StaticRule};

/// Which rule decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// A configured exact-name rule.
    Configured,
    /// A built-in exact-name rule.
    Known,
    /// A configured or built-in prefix rule.
    Prefix,
    /// No rule matched; the dev flag decided.
    Default,
}

/// The result of matching one package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Assigned category.
    pub category: PackageCategory,
    /// Target-platform replacement tag.
    pub migration_target: Option<String>,
    /// Description of the equivalent library.
    pub equivalent: Option<String>,
    /// Which rule matched.
    pub source: RuleSource,
}

impl Classification {
    fn from_rule(rule: &PackageRule, source: RuleSource) -> Self {
        Self {
            category: rule.category,
            migration_target: rule.migration_target.clone(),
            equivalent: rule.equivalent.clone(),
            source,
        }
    }

    fn from_static(rule: &StaticRule, source: RuleSource) -> Self {
        Self {
            category: rule.category,
            migration_target: rule.migration_target.map(str::to_owned),
            equivalent: rule.equivalent.map(str::to_owned),
            source,
        }
    }
}

/// Assigns categories from the built-in tables plus configured rules.
///
/// Lookup order: configured exact names, built-in exact names, configured
/// prefixes, built-in prefixes. Anything unmatched is `needs-evaluation`
/// for production packages and `dev-only` for development packages.
///
/// # Examples
///
/// ```
/// use ue_core::{DepsConfig, PackageCategory, PackageInfo};
/// use ue_deps::Classifier;
///
/// let config = DepsConfig::default();
/// let classifier = Classifier::new(&config);
///
/// let mut packages = vec![
///     PackageInfo::new("@radix-ui/react-dialog", "^1.0.5", false),
///     PackageInfo::new("left-pad", "1.3.0", false),
///     PackageInfo::new("husky", "^9.0.0", true),
/// ];
/// classifier.classify(&mut packages);
///
/// assert_eq!(packages[0].category, PackageCategory::FrontendOnly);
/// assert_eq!(packages[1].category, PackageCategory::NeedsEvaluation);
/// assert_eq!(packages[2].category, PackageCategory::DevOnly);
/// ```
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    config: &'a DepsConfig,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over the configured extra rules.
    #[must_use]
    pub const fn new(config: &'a DepsConfig) -> Self {
        Self { config }
    }

    /// Matches a single package name.
    #[must_use]
    pub fn lookup(&self, name: &str, dev: bool) -> Classification {
        if let Some(rule) = self.config.extra_rules.iter().find(|r| r.pattern == name) {
            return Classification::from_rule(rule, RuleSource::Configured);
        }
        if let Some(rule) = known_package(name) {
            return Classification::from_static(rule, RuleSource::Known);
        }
        if let Some(rule) = self
            .config
            .extra_prefix_rules
            .iter()
            .find(|r| name.starts_with(r.pattern.as_str()))
        {
            return Classification::from_rule(rule, RuleSource::Prefix);
        }
        if let Some(rule) = prefix_rule(name) {
            return Classification::from_static(rule, RuleSource::Prefix);
        }

        Classification {
            category: if dev {
                PackageCategory::DevOnly
            } else {
                PackageCategory::NeedsEvaluation
            },
            migration_target: None,
            equivalent: None,
            source: RuleSource::Default,
        }
    }

    /// Classifies every package in place.
    ///
    /// Running this twice yields the same result; usage and risk fields are
    /// left untouched.
    pub fn classify(&self, packages: &mut [PackageInfo]) {
        for package in packages.iter_mut() {
            let found = self.lookup(&package.name, package.dev);
            debug!(
                package = %package.name,
                category = found.category.as_str(),
                source = ?found.source,
                "Classified package"
            );
            package.category = found.category;
            package.migration_target = found.migration_target;
            package.equivalent = found.equivalent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_rule(pattern: &str, category: PackageCategory) -> PackageRule {
        PackageRule {
            pattern: pattern.to_owned(),
            category,
            migration_target: Some("custom".to_owned()),
            equivalent: None,
        }
    }

    #[test]
    fn test_known_package_details() {
        let config = DepsConfig::default();
        let found = Classifier::new(&config).lookup("@clerk/nextjs", false);
        assert_eq!(found.category, PackageCategory::Migrate);
        assert_eq!(found.migration_target.as_deref(), Some("django-auth"));
        assert_eq!(found.source, RuleSource::Known);
    }

    #[test]
    fn test_known_rule_beats_dev_flag() {
        let config = DepsConfig::default();
        let found = Classifier::new(&config).lookup("drizzle-kit", true);
        assert_eq!(found.category, PackageCategory::Remove);
    }

    #[test]
    fn test_configured_rule_overrides_builtin() {
        let config = DepsConfig {
            extra_rules: vec![custom_rule("stripe", PackageCategory::Remove)],
            ..DepsConfig::default()
        };
        let found = Classifier::new(&config).lookup("stripe", false);
        assert_eq!(found.category, PackageCategory::Remove);
        assert_eq!(found.source, RuleSource::Configured);
    }

    #[test]
    fn test_configured_prefix_before_builtin_prefix() {
        let config = DepsConfig {
            extra_prefix_rules: vec![custom_rule("@radix-ui/react-", PackageCategory::ProductSpecific)],
            ..DepsConfig::default()
        };
        let classifier = Classifier::new(&config);
        assert_eq!(
            classifier.lookup("@radix-ui/react-dialog", false).category,
            PackageCategory::ProductSpecific
        );
        assert_eq!(
            classifier.lookup("@radix-ui/colors", false).category,
            PackageCategory::FrontendOnly
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        let config = DepsConfig::default();
        let classifier = Classifier::new(&config);
        let mut packages = vec![
            PackageInfo::new("zod", "^3.22.0", false),
            PackageInfo::new("@types/node", "^20.0.0", true),
            PackageInfo::new("mystery", "0.0.1", false),
        ];

        classifier.classify(&mut packages);
        let first = packages.clone();
        classifier.classify(&mut packages);
        assert_eq!(packages, first);
        assert_eq!(packages[0].equivalent.as_deref(), Some("DRF serializers and validators"));
        assert_eq!(packages[1].category, PackageCategory::DevOnly);
        assert_eq!(packages[2].category, PackageCategory::NeedsEvaluation);
    }
}
