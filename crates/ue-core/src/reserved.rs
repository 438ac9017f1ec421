//! Reserved identifiers and the `_field` rename convention.
//!
//! Generated Django models cannot use Python keywords as attribute names, and
//! Django rejects a few field names outright. Both the emitter and the data
//! migrator rename such columns by appending [`FIELD_SUFFIX`], so a source
//! column `not` lands in a target column `not_field`.

use std::borrow::Cow;

/// Suffix appended to identifiers that collide with a reserved word.
pub const FIELD_SUFFIX: &str = "_field";

/// Python keywords that cannot be used as attribute names.
///
/// Soft keywords (`match`, `case`, `type`, `_`) are valid identifiers and are
/// not listed.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Field names Django refuses or that shadow model attributes.
pub const DJANGO_RESERVED: &[&str] = &["pk", "objects"];

/// Returns `true` if `name` is a Python keyword.
///
/// # Examples
///
/// ```
/// use ue_core::reserved::is_python_keyword;
///
/// assert!(is_python_keyword("class"));
/// assert!(!is_python_keyword("status"));
/// ```
#[inline]
#[must_use]
pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Returns the `_field` rename for a Python keyword, if `name` is one.
///
/// This is the fixed reserved-word table consulted by the column matcher
/// after the configurable global renames.
///
/// # Examples
///
/// ```
/// use ue_core::reserved::keyword_rename;
///
/// assert_eq!(keyword_rename("not").as_deref(), Some("not_field"));
/// assert_eq!(keyword_rename("name"), None);
/// ```
#[must_use]
pub fn keyword_rename(name: &str) -> Option<String> {
    is_python_keyword(name).then(|| format!("{name}{FIELD_SUFFIX}"))
}

/// Returns the attribute name a generated model uses for `column`.
///
/// Python keywords and Django-reserved names get the `_field` suffix; other
/// names are returned unchanged.
///
/// # Examples
///
/// ```
/// use ue_core::reserved::python_attribute_name;
///
/// assert_eq!(python_attribute_name("from"), "from_field");
/// assert_eq!(python_attribute_name("pk"), "pk_field");
/// assert_eq!(python_attribute_name("title"), "title");
/// ```
#[must_use]
pub fn python_attribute_name(column: &str) -> Cow<'_, str> {
    if is_python_keyword(column) || DJANGO_RESERVED.contains(&column) {
        Cow::Owned(format!("{column}{FIELD_SUFFIX}"))
    } else {
        Cow::Borrowed(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_renamed() {
        for kw in ["class", "from", "import", "global", "pass", "return"] {
            assert_eq!(keyword_rename(kw), Some(format!("{kw}_field")));
        }
    }

    #[test]
    fn test_soft_keywords_untouched() {
        assert!(keyword_rename("type").is_none());
        assert!(keyword_rename("match").is_none());
    }

    #[test]
    fn test_django_reserved_only_in_attribute_names() {
        assert!(keyword_rename("pk").is_none());
        assert_eq!(python_attribute_name("objects"), "objects_field");
    }
}
