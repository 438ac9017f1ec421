//! Table to model lookup used for foreign-key targets.

use ue_core::naming::model_name_for_table;
use ue_core::{FxHashMap, TableDescriptor};

/// Where a table's model lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLocation {
    /// Model class name.
    pub model: String,
    /// Owning module (Django app label).
    pub module: String,
}

/// How a foreign key names its target model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTarget {
    /// The referencing model itself (`'self'`).
    SelfReference,
    /// A model in the same module (`'Member'`).
    Local(String),
    /// A model in another module (`'members.Member'`).
    External {
        /// Module the model lives in.
        module: String,
        /// Model class name.
        model: String,
    },
    /// A table no parsed schema declares; the model name is derived from the
    /// table name and assumed local.
    Unresolved(String),
}

impl ModelTarget {
    /// Renders the target as a Django lazy model reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use ue_codegen::ModelTarget;
    ///
    /// assert_eq!(ModelTarget::SelfReference.reference(), "self");
    /// let target = ModelTarget::External { module: "members".into(), model: "Member".into() };
    /// assert_eq!(target.reference(), "members.Member");
    /// ```
    #[must_use]
    pub fn reference(&self) -> String {
        match self {
            Self::SelfReference => "self".to_owned(),
            Self::Local(model) | Self::Unresolved(model) => model.clone(),
            Self::External { module, model } => format!("{module}.{model}"),
        }
    }

    /// Returns `true` if the target table was never declared.
    #[inline]
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// Maps table names to their generated model and owning module.
///
/// Two modules may both define a model with the same class name, so foreign
/// keys are always resolved through the table name and qualified with the
/// module when they cross modules.
///
/// # Examples
///
/// ```
/// use ue_codegen::{ModelRegistry, ModelTarget};
/// use ue_core::{SourceDialect, TableDescriptor};
///
/// let tables = vec![
///     TableDescriptor::new("members", "members", SourceDialect::Sql, "members.sql"),
///     TableDescriptor::new("claims", "claims", SourceDialect::Sql, "claims.sql"),
/// ];
/// let registry = ModelRegistry::from_tables(&tables);
///
/// assert_eq!(
///     registry.target("claims", "members"),
///     ModelTarget::External { module: "members".into(), model: "Member".into() }
/// );
/// assert_eq!(registry.target("claims", "claims"), ModelTarget::SelfReference);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    by_table: FxHashMap<String, ModelLocation>,
}

impl ModelRegistry {
    /// Builds the registry. The first table with a given name wins.
    #[must_use]
    pub fn from_tables(tables: &[TableDescriptor]) -> Self {
        let mut by_table = FxHashMap::default();
        for table in tables {
            by_table
                .entry(table.table_name.clone())
                .or_insert_with(|| ModelLocation {
                    model: table.model_name.clone(),
                    module: table.module.clone(),
                });
        }
        Self { by_table }
    }

    /// Looks up a table.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&ModelLocation> {
        self.by_table.get(table)
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_table.len()
    }

    /// Returns `true` if no tables are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }

    /// Resolves the model a foreign key on `from_table` pointing at
    /// `to_table` should name.
    #[must_use]
    pub fn target(&self, from_table: &str, to_table: &str) -> ModelTarget {
        if from_table == to_table {
            return ModelTarget::SelfReference;
        }
        let from_module = self.by_table.get(from_table).map(|l| l.module.as_str());
        match self.by_table.get(to_table) {
            Some(location) if Some(location.module.as_str()) == from_module => {
                ModelTarget::Local(location.model.clone())
            }
            Some(location) => ModelTarget::External {
                module: location.module.clone(),
                model: location.model.clone(),
            },
            None => ModelTarget::Unresolved(model_name_for_table(to_table)),
        }
    }
}
