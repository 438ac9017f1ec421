//! Domain types shared across the workspace.
//!
//! # Module Organization
//!
//! - [`column`] - Column descriptors, target type tags, foreign keys
//! - [`table`] - Table descriptors and source dialects
//! - [`package`] - Package classification records and risk tiers
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use ue_core::{ColumnDescriptor, PackageInfo, TableDescriptor};
//! ```

pub mod column;
pub mod package;
pub mod table;

pub use column::{ColumnDescriptor, FieldType, ForeignKeyRef, OnDelete};
pub use package::{PackageCategory, PackageInfo, PackageRule, RiskThresholds, RiskTier};
pub use table::{SourceDialect, TableDescriptor};
