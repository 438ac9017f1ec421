//! Django source generation from parsed table descriptors.
//!
//! For every module (Django app) the emitter renders `models.py`,
//! `serializers.py`, `views.py`, `admin.py`, `tests.py` and `urls.py` as
//! plain text. Rendering is pure; [`write_modules`] and
//! [`GenerationReport::write`] are the only functions touching the disk.
//!
//! # Emission Rules
//!
//! - Every model gets a synthesized UUID `id`; source primary keys on other
//!   columns arrive already demoted to unique fields
//! - Models with a foreign key to the tenant table derive from the tenant
//!   base class, which declares the tenant field itself
//! - Choice fields get a `<FIELD>_CHOICES` list of `(value, label)` pairs and
//!   a `max_length` of the longest value plus [`CHOICE_PADDING`]
//! - Foreign keys name their target through the [`ModelRegistry`], qualified
//!   with the app label when they cross modules
//! - Python keywords and Django-reserved names get the `_field` suffix
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use ue_codegen::{Emitter, ModelRegistry};
//! use ue_core::CodegenConfig;
//! use ue_schema::parse_sql;
//!
//! let parsed = parse_sql(
//!     "CREATE TABLE organizations (id UUID PRIMARY KEY, name TEXT NOT NULL);
//!      CREATE TABLE members (
//!          id UUID PRIMARY KEY,
//!          organization_id UUID NOT NULL REFERENCES organizations(id),
//!          email VARCHAR(320) UNIQUE
//!      );",
//!     Utf8Path::new("core.sql"),
//! )
//! .finalize();
//!
//! let config = CodegenConfig::default();
//! let registry = ModelRegistry::from_tables(&parsed.tables);
//! let modules = Emitter::new(&config, &registry).render_all(&parsed.tables);
//!
//! let models = &modules[0].models;
//! assert!(models.contains("class Member(TenantModel):"));
//! assert!(models.contains("email = models.CharField(max_length=320, unique=True, null=True, blank=True)"));
//! assert!(!models.contains("organization = models.ForeignKey"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod admin;
mod api;
mod emitter;
mod error;
mod fields;
mod registry;
mod report;
mod writer;

pub use emitter::{group_by_module, Emitter, ModuleSources};
pub use error::CodegenError;
pub use fields::CHOICE_PADDING;
pub use registry::{ModelLocation, ModelRegistry, ModelTarget};
pub use report::{GenerationReport, ModuleReport, TableReport};
pub use writer::write_modules;
