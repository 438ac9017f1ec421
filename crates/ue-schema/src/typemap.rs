//! Column/type mapping from source type systems onto [`FieldType`].
//!
//! Both lookup tables are immutable statics. Lookups return `None` for
//! unrecognized types; callers fall back to [`FieldType::Text`] and record a
//! diagnostic.

use ue_core::{CodegenConfig, FieldType};

/// Length used for a bare `CHAR` without a declared length.
const DEFAULT_FIXED_CHAR_LENGTH: u32 = 1;

/// Precision used for `MONEY`.
const MONEY_DIGITS: u32 = 19;

/// SQL base type names that map to a fixed [`FieldType`].
///
/// Parameterized types (`VARCHAR`, `NUMERIC`, `CHAR`) are handled separately
/// because their parameters feed the field type.
const SQL_TYPES: &[(&str, FieldType)] = &[
    ("text", FieldType::Text),
    ("citext", FieldType::Text),
    ("name", FieldType::Text),
    ("smallint", FieldType::SmallInteger),
    ("int2", FieldType::SmallInteger),
    ("smallserial", FieldType::SmallInteger),
    ("serial2", FieldType::SmallInteger),
    ("integer", FieldType::Integer),
    ("int", FieldType::Integer),
    ("int4", FieldType::Integer),
    ("serial", FieldType::Integer),
    ("serial4", FieldType::Integer),
    ("bigint", FieldType::BigInteger),
    ("int8", FieldType::BigInteger),
    ("bigserial", FieldType::BigInteger),
    ("serial8", FieldType::BigInteger),
    ("real", FieldType::Float),
    ("float4", FieldType::Float),
    ("float8", FieldType::Float),
    ("float", FieldType::Float),
    ("double precision", FieldType::Float),
    ("boolean", FieldType::Boolean),
    ("bool", FieldType::Boolean),
    ("date", FieldType::Date),
    ("timestamp", FieldType::DateTime),
    ("timestamptz", FieldType::DateTime),
    ("timestamp with time zone", FieldType::DateTime),
    ("timestamp without time zone", FieldType::DateTime),
    ("time", FieldType::Time),
    ("timetz", FieldType::Time),
    ("time with time zone", FieldType::Time),
    ("time without time zone", FieldType::Time),
    ("interval", FieldType::Duration),
    ("uuid", FieldType::Uuid),
    ("json", FieldType::Json),
    ("jsonb", FieldType::Json),
    ("bytea", FieldType::Binary),
    ("inet", FieldType::Inet),
    ("cidr", FieldType::Inet),
    ("tsvector", FieldType::SearchVector),
];

/// Drizzle builder names that map to a fixed [`FieldType`].
const DRIZZLE_BUILDERS: &[(&str, FieldType)] = &[
    ("text", FieldType::Text),
    ("citext", FieldType::Text),
    ("smallint", FieldType::SmallInteger),
    ("smallserial", FieldType::SmallInteger),
    ("integer", FieldType::Integer),
    ("int", FieldType::Integer),
    ("serial", FieldType::Integer),
    ("bigint", FieldType::BigInteger),
    ("bigserial", FieldType::BigInteger),
    ("real", FieldType::Float),
    ("doublePrecision", FieldType::Float),
    ("boolean", FieldType::Boolean),
    ("date", FieldType::Date),
    ("timestamp", FieldType::DateTime),
    ("time", FieldType::Time),
    ("interval", FieldType::Duration),
    ("uuid", FieldType::Uuid),
    ("json", FieldType::Json),
    ("jsonb", FieldType::Json),
    ("bytea", FieldType::Binary),
    ("inet", FieldType::Inet),
    ("cidr", FieldType::Inet),
    ("tsvector", FieldType::SearchVector),
];

/// A SQL type string split into its parts.
///
/// # Examples
///
/// ```
/// use ue_schema::SqlType;
///
/// let ty = SqlType::parse("NUMERIC(12, 2)");
/// assert_eq!(ty.base, "numeric");
/// assert_eq!(ty.params, vec![12, 2]);
///
/// let ty = SqlType::parse("character varying(40)[]");
/// assert_eq!(ty.base, "character varying");
/// assert!(ty.is_array);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    /// Lowercased base name with parameters removed and whitespace collapsed.
    pub base: String,
    /// Numeric parameters in order.
    pub params: Vec<u32>,
    /// Whether the type ends in `[]` or is declared `ARRAY`.
    pub is_array: bool,
}

impl SqlType {
    /// Splits a raw type string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut text = raw.trim().to_ascii_lowercase().replace('"', "");
        let mut is_array = false;

        loop {
            let trimmed = text.trim_end();
            if let Some(rest) = trimmed.strip_suffix("[]") {
                text = rest.to_owned();
                is_array = true;
            } else if let Some(rest) = trimmed.strip_suffix(" array") {
                text = rest.to_owned();
                is_array = true;
            } else {
                break;
            }
        }

        let mut base = String::with_capacity(text.len());
        let mut params = Vec::new();
        let mut depth = 0usize;
        let mut inner = String::new();
        for c in text.chars() {
            match c {
                '(' => {
                    depth += 1;
                    if depth == 1 {
                        inner.clear();
                        continue;
                    }
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if params.is_empty() {
                            params = inner
                                .split(',')
                                .filter_map(|p| p.trim().parse().ok())
                                .collect();
                        }
                        continue;
                    }
                }
                _ => {}
            }
            if depth == 0 {
                base.push(c);
            } else {
                inner.push(c);
            }
        }

        let base = base
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        // Schema-qualified types (`public.citext`) map by their last segment.
        let base = base.rsplit('.').next().unwrap_or_default().to_owned();

        Self {
            base,
            params,
            is_array,
        }
    }
}

/// Maps a parsed SQL type onto a [`FieldType`].
///
/// # Examples
///
/// ```
/// use ue_core::{CodegenConfig, FieldType};
/// use ue_schema::{map_sql_type, SqlType};
///
/// let config = CodegenConfig::default();
/// assert_eq!(
///     map_sql_type(&SqlType::parse("VARCHAR(50)"), &config),
///     Some(FieldType::Char { max_length: 50 })
/// );
/// assert_eq!(
///     map_sql_type(&SqlType::parse("varchar"), &config),
///     Some(FieldType::Char { max_length: 255 })
/// );
/// assert_eq!(map_sql_type(&SqlType::parse("geography"), &config), None);
/// ```
#[must_use]
pub fn map_sql_type(ty: &SqlType, config: &CodegenConfig) -> Option<FieldType> {
    match ty.base.as_str() {
        "varchar" | "character varying" | "nvarchar" => Some(FieldType::Char {
            max_length: ty.params.first().copied().unwrap_or(config.default_char_length),
        }),
        "char" | "character" | "bpchar" | "nchar" => Some(FieldType::Char {
            max_length: ty.params.first().copied().unwrap_or(DEFAULT_FIXED_CHAR_LENGTH),
        }),
        "numeric" | "decimal" => Some(decimal(ty.params.first(), ty.params.get(1), config)),
        "money" => Some(FieldType::Decimal {
            max_digits: MONEY_DIGITS,
            decimal_places: 2,
        }),
        base => lookup(SQL_TYPES, base),
    }
}

/// Maps a Drizzle column builder onto a [`FieldType`].
///
/// `length`, `precision`, and `scale` come from the builder's options object.
///
/// # Examples
///
/// ```
/// use ue_core::{CodegenConfig, FieldType};
/// use ue_schema::map_drizzle_builder;
///
/// let config = CodegenConfig::default();
/// assert_eq!(
///     map_drizzle_builder("varchar", Some(100), None, None, &config),
///     Some(FieldType::Char { max_length: 100 })
/// );
/// assert_eq!(
///     map_drizzle_builder("numeric", None, Some(12), Some(2), &config),
///     Some(FieldType::Decimal { max_digits: 12, decimal_places: 2 })
/// );
/// assert_eq!(map_drizzle_builder("geometry", None, None, None, &config), None);
/// ```
#[must_use]
pub fn map_drizzle_builder(
    builder: &str,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    config: &CodegenConfig,
) -> Option<FieldType> {
    match builder {
        "varchar" => Some(FieldType::Char {
            max_length: length.unwrap_or(config.default_char_length),
        }),
        "char" => Some(FieldType::Char {
            max_length: length.unwrap_or(DEFAULT_FIXED_CHAR_LENGTH),
        }),
        "numeric" | "decimal" => Some(decimal(precision.as_ref(), scale.as_ref(), config)),
        "text" if length.is_some() => Some(FieldType::Char {
            max_length: length.unwrap_or(config.default_char_length),
        }),
        other => lookup(DRIZZLE_BUILDERS, other),
    }
}

fn decimal(precision: Option<&u32>, scale: Option<&u32>, config: &CodegenConfig) -> FieldType {
    FieldType::Decimal {
        max_digits: precision.copied().unwrap_or(config.default_max_digits),
        decimal_places: scale.copied().unwrap_or(config.default_decimal_places),
    }
}

fn lookup(table: &[(&str, FieldType)], name: &str) -> Option<FieldType> {
    table.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(raw: &str) -> Option<FieldType> {
        map_sql_type(&SqlType::parse(raw), &CodegenConfig::default())
    }

    #[test]
    fn test_parse_multi_word_with_params_inside() {
        let ty = SqlType::parse("TIMESTAMP(3) WITH TIME ZONE");
        assert_eq!(ty.base, "timestamp with time zone");
        assert_eq!(ty.params, vec![3]);
        assert!(!ty.is_array);
    }

    #[test]
    fn test_parse_array_forms() {
        assert!(SqlType::parse("text[]").is_array);
        assert!(SqlType::parse("INTEGER ARRAY").is_array);
        assert_eq!(SqlType::parse("text[][]").base, "text");
    }

    #[test]
    fn test_numeric_variants() {
        assert_eq!(
            sql("NUMERIC(10,2)"),
            Some(FieldType::Decimal {
                max_digits: 10,
                decimal_places: 2
            })
        );
        assert_eq!(
            sql("decimal(5)"),
            Some(FieldType::Decimal {
                max_digits: 5,
                decimal_places: 2
            })
        );
        assert_eq!(
            sql("numeric"),
            Some(FieldType::Decimal {
                max_digits: 10,
                decimal_places: 2
            })
        );
    }

    #[test]
    fn test_common_sql_types() {
        assert_eq!(sql("SERIAL"), Some(FieldType::Integer));
        assert_eq!(sql("BIGSERIAL"), Some(FieldType::BigInteger));
        assert_eq!(sql("double precision"), Some(FieldType::Float));
        assert_eq!(sql("TIMESTAMPTZ"), Some(FieldType::DateTime));
        assert_eq!(sql("JSONB"), Some(FieldType::Json));
        assert_eq!(sql("\"uuid\""), Some(FieldType::Uuid));
        assert_eq!(sql("public.citext"), Some(FieldType::Text));
        assert_eq!(sql("tsvector"), Some(FieldType::SearchVector));
        assert_eq!(sql("CHAR(2)"), Some(FieldType::Char { max_length: 2 }));
    }

    #[test]
    fn test_unknown_types() {
        assert_eq!(sql("geometry(Point, 4326)"), None);
        assert_eq!(sql("ltree"), None);
    }

    #[test]
    fn test_drizzle_text_with_length() {
        let config = CodegenConfig::default();
        assert_eq!(
            map_drizzle_builder("text", None, None, None, &config),
            Some(FieldType::Text)
        );
        assert_eq!(
            map_drizzle_builder("doublePrecision", None, None, None, &config),
            Some(FieldType::Float)
        );
    }
}
