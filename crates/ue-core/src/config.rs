//! Configuration structures for the migration tooling.
//!
//! - [`CodegenConfig`] - Model emission settings (base classes, defaults, module names)
//! - [`DepsConfig`] - Dependency classifier settings (extensions, rules, risk thresholds)
//! - [`MigrateConfig`] - ETL settings (batching, checkpoints, renames, skip lists)
//! - [`Config`] - Root configuration combining all settings
//!
//! Every section uses `#[serde(default)]`, so a configuration file only needs
//! the keys it changes.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reserved::{DJANGO_RESERVED, FIELD_SUFFIX};
use crate::types::{PackageRule, RiskThresholds};
use crate::FxHashMap;

/// Configuration for the code emitter.
///
/// # Examples
///
/// ```
/// use ue_core::CodegenConfig;
///
/// let config = CodegenConfig::default();
/// assert_eq!(config.tenant_table, "organizations");
/// assert_eq!(config.default_char_length, 255);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Directory generated modules are written under.
    pub output_dir: Utf8PathBuf,
    /// Python module that defines the base model classes.
    pub base_module: String,
    /// Base class for models with a foreign key to the tenant table.
    pub tenant_base_class: String,
    /// Base class for every other model.
    pub plain_base_class: String,
    /// Table whose presence as an FK target makes a model tenant-scoped.
    pub tenant_table: String,
    /// Field name the tenant base class already defines.
    pub tenant_field: String,
    /// Length used for `VARCHAR` columns declared without one.
    pub default_char_length: u32,
    /// Precision used for `NUMERIC` columns declared without one.
    pub default_max_digits: u32,
    /// Scale used for `NUMERIC` columns declared without one.
    pub default_decimal_places: u32,
    /// Schema file stem to module name overrides.
    pub module_overrides: FxHashMap<String, String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("generated"),
            base_module: "core.models".to_owned(),
            tenant_base_class: "TenantModel".to_owned(),
            plain_base_class: "BaseModel".to_owned(),
            tenant_table: "organizations".to_owned(),
            tenant_field: "organization".to_owned(),
            default_char_length: 255,
            default_max_digits: 10,
            default_decimal_places: 2,
            module_overrides: FxHashMap::default(),
        }
    }
}

/// Configuration for the dependency classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsConfig {
    /// Extensions of source files scanned for imports.
    pub source_extensions: Vec<String>,
    /// Directory names skipped during scanning, in addition to the built-in list.
    pub skip_dirs: Vec<String>,
    /// Exact-name rules that override the built-in table.
    pub extra_rules: Vec<PackageRule>,
    /// Prefix rules consulted before the built-in prefix list.
    pub extra_prefix_rules: Vec<PackageRule>,
    /// Usage thresholds for risk tiers.
    pub risk: RiskThresholds,
}

impl Default for DepsConfig {
    fn default() -> Self {
        Self {
            source_extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            skip_dirs: Vec::new(),
            extra_rules: Vec::new(),
            extra_prefix_rules: Vec::new(),
            risk: RiskThresholds::default(),
        }
    }
}

/// Per-table adjustments to column matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverride {
    /// Source columns never copied for this table.
    pub skip_columns: Vec<String>,
    /// Source to target renames for this table, applied before global renames.
    pub renames: FxHashMap<String, String>,
}

/// Configuration for the Postgres ETL migrator.
///
/// # Examples
///
/// ```
/// use ue_core::MigrateConfig;
///
/// let config = MigrateConfig::default();
/// assert_eq!(config.batch_size, 1000);
/// assert_eq!(config.global_renames.get("pk").map(String::as_str), Some("pk_field"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Rows per INSERT round-trip.
    pub batch_size: usize,
    /// Directory holding checkpoint files.
    pub checkpoint_dir: Utf8PathBuf,
    /// Connection-establish timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Database schema to introspect on both sides.
    pub schema: String,
    /// Source columns never copied, in any table.
    pub always_skip_columns: Vec<String>,
    /// Source to target column renames applied in every table.
    pub global_renames: FxHashMap<String, String>,
    /// Tables never migrated even when both sides have them.
    pub excluded_tables: Vec<String>,
    /// Per-table matching overrides.
    pub table_overrides: FxHashMap<String, TableOverride>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            checkpoint_dir: Utf8PathBuf::from(".migration"),
            connect_timeout_secs: 30,
            schema: "public".to_owned(),
            always_skip_columns: vec!["search_vector".to_owned()],
            global_renames: DJANGO_RESERVED
                .iter()
                .map(|name| ((*name).to_owned(), format!("{name}{FIELD_SUFFIX}")))
                .collect(),
            excluded_tables: [
                "django_migrations",
                "django_content_type",
                "django_admin_log",
                "django_session",
                "auth_permission",
                "auth_group",
                "auth_group_permissions",
                "__drizzle_migrations",
                "schema_migrations",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            table_overrides: FxHashMap::default(),
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use ue_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{"migrate": {"batch_size": 500}}"#).unwrap();
/// assert_eq!(config.migrate.batch_size, 500);
/// assert_eq!(config.codegen.plain_base_class, "BaseModel");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Code emitter configuration.
    pub codegen: CodegenConfig,
    /// Dependency classifier configuration.
    pub deps: DepsConfig,
    /// ETL configuration.
    pub migrate: MigrateConfig,
}

impl Config {
    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON, and
    /// [`ConfigError::InvalidOption`] if a value is out of range.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.migrate.batch_size == 0 {
            return Err(ConfigError::invalid("migrate.batch_size", "must be positive"));
        }
        if self.codegen.default_char_length == 0 {
            return Err(ConfigError::invalid(
                "codegen.default_char_length",
                "must be positive",
            ));
        }
        if self.codegen.default_decimal_places > self.codegen.default_max_digits {
            return Err(ConfigError::invalid(
                "codegen.default_decimal_places",
                "cannot exceed default_max_digits",
            ));
        }
        if self.deps.risk.medium_from > self.deps.risk.high_above {
            return Err(ConfigError::invalid(
                "deps.risk.medium_from",
                "cannot exceed high_above",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_config_defaults() {
        let config = MigrateConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.always_skip_columns, vec!["search_vector"]);
        assert!(config.excluded_tables.iter().any(|t| t == "django_migrations"));
    }

    #[test]
    fn test_deps_config_defaults() {
        let config = DepsConfig::default();
        assert!(config.source_extensions.contains(&"tsx".to_owned()));
        assert_eq!(config.risk.high_above, 20);
        assert_eq!(config.risk.medium_from, 6);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"codegen": {"tenant_base_class": "OrgScopedModel"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.codegen.tenant_base_class, "OrgScopedModel");
        assert_eq!(config.codegen.plain_base_class, "BaseModel");
        assert_eq!(config.migrate.batch_size, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.migrate.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("ue.json")).unwrap();
        std::fs::write(&path, r#"{"deps": {"risk": {"high_above": 50}}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.deps.risk.high_above, 50);
        assert_eq!(config.deps.risk.medium_from, 6);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Utf8Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
