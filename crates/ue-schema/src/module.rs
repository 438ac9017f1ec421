//! Module (Django app) names derived from schema file paths.

use camino::Utf8Path;
use ue_core::naming::to_snake_case;
use ue_core::FxHashMap;

/// File-name suffixes that mark a schema file without naming its module.
const SCHEMA_SUFFIXES: &[&str] = &["-schema", "_schema", ".schema", "-schemas", "_schemas"];

/// Fallback module when a path has no usable stem.
pub const DEFAULT_MODULE: &str = "core";

/// Derives the owning module for a schema file.
///
/// A configured override for the file stem wins. Otherwise the stem is
/// stripped of a trailing `-schema` style suffix and snake-cased.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use ue_core::FxHashMap;
/// use ue_schema::module_for_path;
///
/// let overrides = FxHashMap::default();
/// assert_eq!(module_for_path(Utf8Path::new("db/schema/claims-schema.ts"), &overrides), "claims");
/// assert_eq!(module_for_path(Utf8Path::new("sql/memberDues.sql"), &overrides), "member_dues");
/// assert_eq!(module_for_path(Utf8Path::new("schema.sql"), &overrides), "schema");
/// ```
#[must_use]
pub fn module_for_path(path: &Utf8Path, overrides: &FxHashMap<String, String>) -> String {
    let Some(stem) = path.file_stem() else {
        return DEFAULT_MODULE.to_owned();
    };

    if let Some(module) = overrides.get(stem) {
        return module.clone();
    }

    let trimmed = SCHEMA_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .filter(|s| !s.is_empty())
        .unwrap_or(stem);

    let module = to_snake_case(trimmed);
    if module.is_empty() {
        DEFAULT_MODULE.to_owned()
    } else {
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let mut overrides = FxHashMap::default();
        overrides.insert("claims-schema".to_owned(), "grievances".to_owned());
        assert_eq!(
            module_for_path(Utf8Path::new("claims-schema.ts"), &overrides),
            "grievances"
        );
    }

    #[test]
    fn test_double_extension() {
        assert_eq!(
            module_for_path(Utf8Path::new("billing.schema.ts"), &FxHashMap::default()),
            "billing"
        );
    }

    #[test]
    fn test_bare_suffix_kept() {
        assert_eq!(
            module_for_path(Utf8Path::new("-schema.sql"), &FxHashMap::default()),
            "schema"
        );
    }
}
