//! Identifier conversions between schema, TypeScript, and Python naming styles.
//!
//! Table names arrive as `snake_case` (SQL) or as JavaScript variable names
//! (`camelCase`, Drizzle). Generated models use `PascalCase` singular class
//! names, and choice labels are title-cased.
//!
//! # Examples
//!
//! ```
//! use ue_core::naming::{model_name_for_table, to_snake_case, titleize};
//!
//! assert_eq!(to_snake_case("grievanceSteps"), "grievance_steps");
//! assert_eq!(model_name_for_table("grievance_steps"), "GrievanceStep");
//! assert_eq!(titleize("in_progress"), "In Progress");
//! ```

/// Words whose singular form does not follow the suffix rules.
const IRREGULAR_SINGULARS: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("criteria", "criterion"),
    ("indices", "index"),
    ("statuses", "status"),
    ("bonuses", "bonus"),
    ("campuses", "campus"),
    ("viruses", "virus"),
];

/// Words that are already singular (or uncountable) despite their endings.
const UNCOUNTABLE: &[&str] = &[
    "data", "media", "metadata", "news", "series", "species", "feedback", "staff", "equipment",
    "information", "analytics",
];

/// Converts `camelCase`, `PascalCase`, `kebab-case`, or spaced text to `snake_case`.
///
/// Runs of capitals are treated as one word (`HTTPServer` becomes `http_server`).
///
/// # Examples
///
/// ```
/// use ue_core::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("orgId"), "org_id");
/// assert_eq!(to_snake_case("HTTPServer"), "http_server");
/// assert_eq!(to_snake_case("grievance-steps"), "grievance_steps");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
#[must_use]
pub fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '.' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Converts any supported naming style to `PascalCase`.
///
/// # Examples
///
/// ```
/// use ue_core::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("cba_clause"), "CbaClause");
/// assert_eq!(to_pascal_case("memberDues"), "MemberDues");
/// ```
#[must_use]
pub fn to_pascal_case(input: &str) -> String {
    to_snake_case(input)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Returns the singular form of a single lowercase word.
///
/// Only English suffix rules common in table names are handled.
#[must_use]
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();

    if let Some((_, singular)) = IRREGULAR_SINGULARS
        .iter()
        .find(|(plural, _)| *plural == lower)
    {
        return (*singular).to_owned();
    }
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_owned();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() > 1 {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_owned();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_owned();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_owned(),
        _ => word.to_owned(),
    }
}

/// Derives a model class name from a table name.
///
/// Only the last `snake_case` segment is singularized.
///
/// # Examples
///
/// ```
/// use ue_core::naming::model_name_for_table;
///
/// assert_eq!(model_name_for_table("organizations"), "Organization");
/// assert_eq!(model_name_for_table("member_statuses"), "MemberStatus");
/// assert_eq!(model_name_for_table("dues_categories"), "DuesCategory");
/// ```
#[must_use]
pub fn model_name_for_table(table: &str) -> String {
    let snake = to_snake_case(table);
    let mut parts: Vec<String> = snake
        .split('_')
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();

    if let Some(last) = parts.pop() {
        parts.push(singularize(&last));
    }

    parts.iter().map(|p| capitalize(p)).collect()
}

/// Turns a stored choice value into a human label.
///
/// Underscores and hyphens become spaces and every word is capitalized with the
/// rest lowercased.
///
/// # Examples
///
/// ```
/// use ue_core::naming::titleize;
///
/// assert_eq!(titleize("step_1_review"), "Step 1 Review");
/// assert_eq!(titleize("HIGH-PRIORITY"), "High Priority");
/// ```
#[must_use]
pub fn titleize(value: &str) -> String {
    value
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| capitalize(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_from_camel() {
        assert_eq!(to_snake_case("organizationId"), "organization_id");
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("claimID"), "claim_id");
        assert_eq!(to_snake_case("address2Line"), "address2_line");
    }

    #[test]
    fn test_snake_case_leaves_snake_alone() {
        assert_eq!(to_snake_case("cba_clauses"), "cba_clauses");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_singularize_rules() {
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("members"), "member");
        assert_eq!(singularize("courses"), "course");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("data"), "data");
    }

    #[test]
    fn test_model_name_for_table() {
        assert_eq!(model_name_for_table("grievances"), "Grievance");
        assert_eq!(model_name_for_table("user_roles"), "UserRole");
        assert_eq!(model_name_for_table("grievanceSteps"), "GrievanceStep");
        assert_eq!(model_name_for_table("audit_log"), "AuditLog");
    }

    #[test]
    fn test_titleize() {
        assert_eq!(titleize("open"), "Open");
        assert_eq!(titleize("in_progress"), "In Progress");
        assert_eq!(titleize("under-review"), "Under Review");
        assert_eq!(titleize(""), "");
    }
}
