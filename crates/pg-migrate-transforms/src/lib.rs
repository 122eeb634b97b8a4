//! # pg-migrate-transforms
//!
//! Value transformation layer for migrating rows into PostgreSQL.
//!
//! Between row extraction and COPY serialization, every field passes through
//! a *transform* that turns the source driver's value into the literal
//! PostgreSQL expects. This crate provides:
//!
//! - **Canonical encoders** for MySQL, SQLite and SQL Server quirks (zero
//!   dates, tinyint booleans, SET columns, geometry text, binary literals)
//! - **Identifier resolution** of transform names against a built-in registry,
//!   an override table and an isolated user namespace
//! - **Typmod parsing** and a small **predicate language** over
//!   `precision`/`scale` for type-directed cast rules
//! - **YAML configuration** of user transforms and rules, validated at load
//!
//! ## Example
//!
//! ```rust
//! use pg_migrate_transforms::{Encoded, RawValue, TransformConfig};
//!
//! let config = TransformConfig::from_yaml(
//!     r#"
//! rules:
//!   - type: tinyint
//!     when: "precision = 1"
//!     transform: tinyint-to-boolean
//! "#,
//! )?;
//! let set = config.build()?;
//!
//! let rule = set.select("tinyint", "tinyint(1)")?.expect("rule");
//! assert_eq!(rule.encode("active", 0, &RawValue::from("1"))?, Encoded::text("t"));
//! # Ok::<(), pg_migrate_transforms::TransformError>(())
//! ```
//!
//! Everything is resolved and compiled at load time. The resulting
//! [`TransformSet`] and [`Transform`] handles are immutable and `Send + Sync`,
//! so they can be shared by any number of row workers.

pub mod config;
pub mod core;
pub mod encode;
pub mod error;
pub mod predicate;
pub mod rules;
pub mod typmod;

// Re-exports for convenient access
pub use config::{
    BuiltinAliasConfig, ChainConfig, RuleConfig, TransformConfig, UserTransformConfig, WhenConfig,
};
pub use crate::core::{
    BitElem, BuiltinRegistry, Encoded, OverrideTable, RawValue, Resolved, Transform,
    TransformCatalog, UserNamespace, UserSymbol,
};
pub use encode::{builtin_transforms, SourceEncoding};
pub use error::{Result, TransformError};
pub use predicate::{TypmodExpr, TypmodPredicate};
pub use rules::{CastRule, CastRules, TransformSet};
pub use typmod::{parse_typmod, Typmod};
