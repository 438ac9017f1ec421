//! Built-in classification tables.
//!
//! Exact names are looked up first; prefix rules are a fallback for package
//! families that share a scope or naming convention.

use ue_core::PackageCategory::{
    self, DevOnly, FrontendOnly, Keep, Migrate, ProductSpecific, Remove, SharedInfrastructure,
};

/// A built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticRule {
    /// Exact package name, or a prefix in [`PREFIX_RULES`].
    pub pattern: &'static str,
    /// Assigned category.
    pub category: PackageCategory,
    /// Target-platform replacement tag.
    pub migration_target: Option<&'static str>,
    /// Description of the equivalent library.
    pub equivalent: Option<&'static str>,
}

const fn rule(
    pattern: &'static str,
    category: PackageCategory,
    migration_target: Option<&'static str>,
    equivalent: Option<&'static str>,
) -> StaticRule {
    StaticRule {
        pattern,
        category,
        migration_target,
        equivalent,
    }
}

/// Known packages by exact name.
pub const KNOWN_PACKAGES: &[StaticRule] = &[
    // Data access
    rule("drizzle-orm", Migrate, Some("django-orm"), Some("Django ORM models and querysets")),
    rule("drizzle-kit", Remove, Some("django-migrations"), Some("manage.py makemigrations")),
    rule("drizzle-zod", Migrate, Some("drf-serializers"), Some("DRF ModelSerializer")),
    rule("pg", Remove, Some("psycopg"), Some("psycopg via the Django database backend")),
    rule("postgres", Remove, Some("psycopg"), Some("psycopg via the Django database backend")),
    rule("@neondatabase/serverless", Remove, Some("psycopg"), Some("psycopg connection pooling")),
    rule("@vercel/postgres", Remove, Some("psycopg"), Some("psycopg via the Django database backend")),
    // Auth
    rule("@clerk/nextjs", Migrate, Some("django-auth"), Some("django-allauth with DRF token auth")),
    rule("@clerk/clerk-sdk-node", Migrate, Some("django-auth"), Some("django-allauth with DRF token auth")),
    rule("next-auth", Migrate, Some("django-auth"), Some("django.contrib.auth sessions")),
    rule("jsonwebtoken", Migrate, Some("simplejwt"), Some("djangorestframework-simplejwt")),
    rule("jose", Migrate, Some("simplejwt"), Some("PyJWT")),
    rule("bcrypt", Remove, Some("django-hashers"), Some("django.contrib.auth.hashers")),
    rule("bcryptjs", Remove, Some("django-hashers"), Some("django.contrib.auth.hashers")),
    // Validation and HTTP
    rule("zod", Migrate, Some("drf-serializers"), Some("DRF serializers and validators")),
    rule("yup", Migrate, Some("drf-serializers"), Some("DRF serializers and validators")),
    rule("express", Remove, Some("django"), Some("Django views and URL routing")),
    rule("axios", Migrate, Some("httpx"), Some("httpx or requests")),
    rule("node-fetch", Remove, Some("httpx"), Some("httpx or requests")),
    rule("uuid", Remove, Some("python-stdlib"), Some("uuid module")),
    rule("lodash", Remove, Some("python-stdlib"), Some("itertools and functools")),
    // Jobs, mail, logging
    rule("bullmq", Migrate, Some("celery"), Some("Celery tasks")),
    rule("node-cron", Migrate, Some("celery-beat"), Some("Celery beat schedules")),
    rule("resend", Migrate, Some("django-anymail"), Some("django-anymail Resend backend")),
    rule("nodemailer", Migrate, Some("django-mail"), Some("django.core.mail")),
    rule("winston", Migrate, Some("python-logging"), Some("logging with structlog")),
    rule("pino", Migrate, Some("python-logging"), Some("logging with structlog")),
    // Shared infrastructure
    rule("@sentry/nextjs", SharedInfrastructure, Some("sentry-sdk"), Some("sentry-sdk Django integration")),
    rule("@upstash/redis", SharedInfrastructure, Some("django-redis"), Some("django-redis cache backend")),
    rule("@upstash/ratelimit", SharedInfrastructure, Some("django-ratelimit"), Some("django-ratelimit")),
    rule("ioredis", SharedInfrastructure, Some("django-redis"), Some("django-redis cache backend")),
    rule("redis", SharedInfrastructure, Some("django-redis"), Some("django-redis cache backend")),
    rule("@vercel/blob", SharedInfrastructure, Some("django-storages"), Some("django-storages")),
    rule("@azure/storage-blob", SharedInfrastructure, Some("django-storages"), Some("django-storages Azure backend")),
    rule("posthog-js", SharedInfrastructure, None, Some("posthog Python client")),
    // Client SDKs kept as-is
    rule("stripe", Keep, Some("stripe-python"), Some("stripe Python SDK")),
    rule("openai", Keep, Some("openai-python"), Some("openai Python SDK")),
    rule("@anthropic-ai/sdk", Keep, Some("anthropic-python"), Some("anthropic Python SDK")),
    rule("twilio", Keep, Some("twilio-python"), Some("twilio Python SDK")),
    rule("svix", Keep, Some("svix-python"), Some("svix Python SDK")),
    // Product features
    rule("pdf-lib", ProductSpecific, Some("reportlab"), Some("ReportLab")),
    rule("pdfkit", ProductSpecific, Some("reportlab"), Some("ReportLab")),
    rule("xlsx", ProductSpecific, Some("openpyxl"), Some("openpyxl")),
    rule("exceljs", ProductSpecific, Some("openpyxl"), Some("openpyxl")),
    rule("papaparse", ProductSpecific, Some("python-stdlib"), Some("csv module")),
    rule("docusign-esign", ProductSpecific, Some("docusign-esign"), Some("docusign-esign Python SDK")),
    // Browser bundle
    rule("next", FrontendOnly, None, None),
    rule("react", FrontendOnly, None, None),
    rule("react-dom", FrontendOnly, None, None),
    rule("react-hook-form", FrontendOnly, None, None),
    rule("next-intl", FrontendOnly, None, None),
    rule("lucide-react", FrontendOnly, None, None),
    rule("recharts", FrontendOnly, None, None),
    rule("framer-motion", FrontendOnly, None, None),
    rule("clsx", FrontendOnly, None, None),
    rule("tailwind-merge", FrontendOnly, None, None),
    rule("class-variance-authority", FrontendOnly, None, None),
    rule("date-fns", FrontendOnly, None, None),
    rule("sonner", FrontendOnly, None, None),
    // Tooling
    rule("typescript", DevOnly, None, None),
    rule("tailwindcss", DevOnly, None, None),
    rule("postcss", DevOnly, None, None),
    rule("prettier", DevOnly, None, None),
    rule("vitest", DevOnly, Some("pytest"), Some("pytest")),
    rule("jest", DevOnly, Some("pytest"), Some("pytest")),
    rule("tsx", DevOnly, None, None),
];

/// Prefix rules, consulted in order after exact names.
pub const PREFIX_RULES: &[StaticRule] = &[
    rule("@radix-ui/", FrontendOnly, None, None),
    rule("@tanstack/", FrontendOnly, None, None),
    rule("@tiptap/", FrontendOnly, None, None),
    rule("@next/", FrontendOnly, None, None),
    rule("@testing-library/", DevOnly, None, None),
    rule("@types/", DevOnly, None, None),
    rule("eslint", DevOnly, None, None),
    rule("@typescript-eslint/", DevOnly, None, None),
    rule("@clerk/", Migrate, Some("django-auth"), Some("django-allauth with DRF token auth")),
    rule("drizzle-", Migrate, Some("django-orm"), Some("Django ORM")),
    rule("@sentry/", SharedInfrastructure, Some("sentry-sdk"), Some("sentry-sdk")),
    rule("@opentelemetry/", SharedInfrastructure, Some("opentelemetry-python"), Some("opentelemetry-sdk")),
    rule("@aws-sdk/", SharedInfrastructure, Some("boto3"), Some("boto3")),
    rule("@azure/", SharedInfrastructure, Some("azure-sdk"), Some("azure-sdk-for-python")),
];

/// Looks up a built-in exact-name rule.
#[must_use]
pub fn known_package(name: &str) -> Option<&'static StaticRule> {
    KNOWN_PACKAGES.iter().find(|r| r.pattern == name)
}

/// Returns the first built-in prefix rule matching `name`.
#[must_use]
pub fn prefix_rule(name: &str) -> Option<&'static StaticRule> {
    PREFIX_RULES.iter().find(|r| name.starts_with(r.pattern))
}

#[cfg(test)]
mod tests {
    use ue_core::FxHashSet;

    use super::*;

    #[test]
    fn test_known_names_are_unique() {
        let mut seen = FxHashSet::default();
        for rule in KNOWN_PACKAGES {
            assert!(seen.insert(rule.pattern), "duplicate rule {}", rule.pattern);
        }
    }

    #[test]
    fn test_exact_lookup() {
        let rule = known_package("drizzle-orm").unwrap();
        assert_eq!(rule.category, Migrate);
        assert_eq!(rule.migration_target, Some("django-orm"));
        assert!(known_package("left-pad").is_none());
    }

    #[test]
    fn test_prefix_lookup_order() {
        assert_eq!(prefix_rule("@radix-ui/react-dialog").map(|r| r.category), Some(FrontendOnly));
        assert_eq!(prefix_rule("@typescript-eslint/parser").map(|r| r.category), Some(DevOnly));
        assert_eq!(prefix_rule("@aws-sdk/client-s3").map(|r| r.category), Some(SharedInfrastructure));
        assert!(prefix_rule("radix").is_none());
    }
}
