//! Callable transform handles.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TransformError};

use super::value::{Encoded, RawValue};

/// Signature shared by every transform body.
pub type TransformFn = dyn Fn(&[RawValue<'_>]) -> Result<Encoded> + Send + Sync;

/// A named, pure function from source values to one encoded value.
///
/// Cloning is cheap (two `Arc` bumps), so a handle resolved once at
/// configuration load can be copied into every worker.
#[derive(Clone)]
pub struct Transform {
    name: Arc<str>,
    arity: usize,
    func: Arc<TransformFn>,
}

impl Transform {
    /// Create a transform taking exactly `arity` arguments.
    pub fn new<F>(name: impl Into<Arc<str>>, arity: usize, func: F) -> Self
    where
        F: Fn(&[RawValue<'_>]) -> Result<Encoded> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// Create a single-argument transform.
    pub fn unary<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&RawValue<'_>) -> Result<Encoded> + Send + Sync + 'static,
    {
        Self::new(name, 1, move |args| func(&args[0]))
    }

    /// Same body under a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            arity: self.arity,
            func: Arc::clone(&self.func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Apply the transform, checking the argument count first.
    pub fn apply(&self, args: &[RawValue<'_>]) -> Result<Encoded> {
        if args.len() != self.arity {
            return Err(TransformError::Arity {
                transform: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }
        (self.func)(args)
    }

    /// Apply a single-argument transform.
    pub fn apply_one(&self, value: &RawValue<'_>) -> Result<Encoded> {
        self.apply(std::slice::from_ref(value))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
