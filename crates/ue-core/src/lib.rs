//! Core types, naming rules, and configuration for the Union Eyes migration tooling.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - Schema descriptors produced by the parsers ([`TableDescriptor`],
//!   [`ColumnDescriptor`], [`FieldType`], [`ForeignKeyRef`])
//! - Dependency classification records ([`PackageInfo`], [`PackageCategory`],
//!   [`RiskTier`])
//! - Naming helpers used by the emitter and the migrator ([`naming`])
//! - The reserved-word table shared by code generation and data migration
//!   ([`reserved`])
//! - Configuration structures ([`Config`]) and [`ConfigError`]
//! - Type aliases for `FxHashMap`/`FxHashSet`

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod naming;
pub mod reserved;
pub mod types;

pub use config::{CodegenConfig, Config, DepsConfig, MigrateConfig, TableOverride};
pub use error::ConfigError;
pub use types::{
    ColumnDescriptor, FieldType, ForeignKeyRef, OnDelete, PackageCategory, PackageInfo,
    PackageRule, RiskThresholds, RiskTier, SourceDialect, TableDescriptor,
};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
///
/// Keys in this workspace are table, column, and package names, none of which
/// need denial-of-service resistance.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
