//! Core abstractions shared by every encoder.
//!
//! - [`value`]: raw input values and encoded results
//! - [`transform`]: the callable transform handle
//! - [`registry`]: built-in registry, override table and user namespace
//!
//! Encoders are plain functions over [`RawValue`]. They are wrapped into
//! [`Transform`] handles and registered by name, so configuration can refer to
//! them without knowing where they live.

pub mod registry;
pub mod transform;
pub mod value;

pub use registry::{
    BuiltinRegistry, OverrideTable, Resolved, TransformCatalog, UserNamespace, UserSymbol,
    RESERVED_NAMES,
};
pub use transform::{Transform, TransformFn};
pub use value::{BitElem, Encoded, RawValue};
