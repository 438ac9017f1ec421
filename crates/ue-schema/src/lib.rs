//! Schema parsers producing dialect-independent table descriptors.
//!
//! Two source dialects are supported:
//!
//! - SQL DDL (`CREATE TABLE`, `CREATE TYPE ... AS ENUM`, `ALTER TABLE ... ADD`,
//!   `CREATE UNIQUE INDEX`) via [`parse_sql`] and [`SqlSchemaParser`]
//! - Drizzle ORM declarations via [`DrizzleSchema`]
//!
//! Both produce [`TableDescriptor`](ue_core::TableDescriptor)s. Parsing is
//! lenient: anything that cannot be understood is skipped and recorded as a
//! [`Diagnostic`] instead of failing the run. Only I/O and grammar loading
//! return errors.
//!
//! # Overview
//!
//! ```
//! use camino::Utf8Path;
//! use ue_schema::{parse_sql, DiagnosticKind};
//!
//! let parsed = parse_sql(
//!     "CREATE TABLE units (id UUID PRIMARY KEY, code CHAR(4) PRIMARY KEY, geom GEOMETRY);",
//!     Utf8Path::new("units.sql"),
//! )
//! .finalize();
//!
//! let units = parsed.table("units").unwrap();
//! assert!(units.column("code").unwrap().unique);
//! assert_eq!(parsed.count(DiagnosticKind::UnknownType), 1);
//! ```
//!
//! # Batch Parsing
//!
//! [`parse_schema_files`] walks files and directories, routes each file to
//! its parser, and runs [`finalize_tables`] over the combined result.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod diagnostics;
mod drizzle;
mod error;
mod files;
mod module;
mod normalize;
mod sql;
mod typemap;

pub use diagnostics::{Diagnostic, DiagnosticKind, ParsedSchema};
pub use drizzle::{DrizzleSchema, NOW_DEFAULT, RANDOM_UUID_DEFAULT};
pub use error::SchemaError;
pub use files::parse_schema_files;
pub use module::{module_for_path, DEFAULT_MODULE};
pub use normalize::finalize_tables;
pub use sql::{parse_sql, SqlSchemaParser};
pub use typemap::{map_drizzle_builder, map_sql_type, SqlType};
