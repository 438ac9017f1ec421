//! TypeScript parsing with tree-sitter for schema and dependency analysis.
//!
//! This crate reads two things out of TypeScript and JavaScript sources:
//!
//! - Drizzle ORM table and enum declarations, as uninterpreted syntax
//!   ([`DrizzleModule`])
//! - Module specifiers from `import`, `export ... from`, `import()`, and
//!   `require()` ([`ModuleSpecifier`])
//!
//! # Overview
//!
//! ```
//! use ue_ts_parser::{ArgValue, TsParser};
//!
//! let mut parser = TsParser::new()?;
//! let source = r#"
//!     import { pgTable, uuid, varchar } from 'drizzle-orm/pg-core';
//!
//!     export const members = pgTable('members', {
//!         id: uuid('id').primaryKey(),
//!         email: varchar('email', { length: 320 }).notNull().unique(),
//!     });
//! "#;
//!
//! let module = parser.drizzle(source)?;
//! let email = &module.tables[0].fields[1];
//! assert_eq!(email.builder, "varchar");
//! assert!(email.has_call("unique"));
//! assert_eq!(
//!     email.options().and_then(|o| o.get("length")),
//!     Some(&ArgValue::Number("320".to_owned()))
//! );
//!
//! let specifiers = parser.module_specifiers(source)?;
//! assert_eq!(specifiers[0].package_name(), Some("drizzle-orm"));
//! # Ok::<(), ue_ts_parser::ParseError>(())
//! ```
//!
//! # Thread Safety
//!
//! [`TsParser`] is `Send` but not `Sync`; create one per worker thread. The
//! compiled queries are cached globally and shared.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod drizzle;
pub mod error;
mod node;
mod parser;
pub mod queries;
mod specifiers;

pub use drizzle::{
    ArgValue, ChainCall, ConstraintDecl, ConstraintKind, DrizzleModule, EnumDecl, FieldDecl,
    SkippedEntry, TableDecl,
};
pub use error::ParseError;
pub use parser::{Grammar, TsParser};
pub use specifiers::{extract_module_specifiers, ModuleSpecifier, SpecifierKind};
