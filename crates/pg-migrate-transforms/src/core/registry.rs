//! Transform registry and identifier resolution.
//!
//! Operators name transforms with plain identifiers in configuration. A name
//! resolves in three tiers:
//!
//! 1. an [`OverrideTable`] entry, returned verbatim (e.g. `nil` → NULL);
//! 2. a *function* in the [`BuiltinRegistry`];
//! 3. otherwise a fresh [`UserSymbol`] interned in the [`UserNamespace`].
//!
//! The built-in namespace also holds reserved, non-function bindings
//! (`t`, `nil`, `true`, ...). Those are never returned by resolution, so a
//! user who names a transform `true` gets a user symbol rather than an engine
//! internal.
//!
//! Like the driver catalog of the migration engine, registries are built
//! explicitly and handed to whoever needs them; there is no global state.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::encode;
use crate::error::{Result, TransformError};

use super::transform::Transform;
use super::value::{Encoded, RawValue};

/// Names bound in the built-in namespace that are not functions.
pub const RESERVED_NAMES: &[&str] = &[
    "t", "nil", "null", "true", "false", "and", "or", "not", "precision", "scale", "typemod",
];

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[derive(Clone)]
enum Binding {
    Function(Transform),
    Reserved,
}

/// Built-in namespace: transform functions plus reserved data bindings.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    bindings: HashMap<String, Binding>,
}

impl BuiltinRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in encoder and reserved name.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in RESERVED_NAMES {
            registry.reserve(name);
        }
        for transform in encode::builtin_transforms() {
            registry.register(transform);
        }
        registry
    }

    /// Register a transform function under its own name.
    pub fn register(&mut self, transform: Transform) {
        self.bindings
            .insert(normalize(transform.name()), Binding::Function(transform));
    }

    /// Bind a name that must never resolve to a function.
    pub fn reserve(&mut self, name: &str) {
        self.bindings.insert(normalize(name), Binding::Reserved);
    }

    /// Look up a function, case-insensitively. Reserved names give `None`.
    pub fn get_function(&self, name: &str) -> Option<&Transform> {
        match self.bindings.get(&normalize(name)) {
            Some(Binding::Function(t)) => Some(t),
            _ => None,
        }
    }

    /// Check if a function is registered under this name.
    pub fn has_function(&self, name: &str) -> bool {
        self.get_function(name).is_some()
    }

    /// Check if the name is a reserved, non-function binding.
    pub fn is_reserved(&self, name: &str) -> bool {
        matches!(self.bindings.get(&normalize(name)), Some(Binding::Reserved))
    }

    /// Get all function names, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .bindings
            .iter()
            .filter(|(_, b)| matches!(b, Binding::Function(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("functions", &self.function_names().len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

/// Literal names forced to fixed results, bypassing all lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: HashMap<String, Encoded>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual table: `nil` and `null` resolve to the NULL marker.
    pub fn with_null_literals() -> Self {
        Self::new().with("nil", Encoded::Null).with("null", Encoded::Null)
    }

    /// Add an entry (builder style).
    #[must_use]
    pub fn with(mut self, name: &str, value: Encoded) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: Encoded) {
        self.entries.insert(normalize(name), value);
    }

    pub fn get(&self, name: &str) -> Option<&Encoded> {
        self.entries.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identifier interned in the user namespace.
///
/// Two symbols compare equal exactly when their normalized names do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserSymbol(Arc<str>);

impl UserSymbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Isolated namespace for user-declared transform names.
///
/// Shares no bindings with the built-in registry.
#[derive(Debug, Clone, Default)]
pub struct UserNamespace {
    symbols: HashSet<Arc<str>>,
    functions: HashMap<Arc<str>, Transform>,
}

impl UserNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing symbol if already present.
    pub fn intern(&mut self, name: &str) -> UserSymbol {
        let key = normalize(name);
        if let Some(existing) = self.symbols.get(key.as_str()) {
            return UserSymbol(Arc::clone(existing));
        }
        let sym: Arc<str> = Arc::from(key);
        self.symbols.insert(Arc::clone(&sym));
        UserSymbol(sym)
    }

    /// Bind a function to a symbol, replacing any earlier binding.
    pub fn bind(&mut self, symbol: &UserSymbol, transform: Transform) {
        if self.functions.contains_key(&symbol.0) {
            warn!("Rebinding user transform {}", symbol);
        }
        self.functions.insert(Arc::clone(&symbol.0), transform);
    }

    /// Function bound to a symbol, if any.
    pub fn lookup(&self, symbol: &UserSymbol) -> Option<&Transform> {
        self.functions.get(&symbol.0)
    }

    pub fn is_bound(&self, symbol: &UserSymbol) -> bool {
        self.functions.contains_key(&symbol.0)
    }

    /// Get all bound names, sorted.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(|k| &**k).collect();
        names.sort_unstable();
        names
    }
}

/// Outcome of resolving a transform identifier.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// Fixed result from the override table, under its normalized name.
    Value { name: String, value: Encoded },
    /// Built-in transform function.
    Builtin(Transform),
    /// User-namespace identifier; callable once something is bound to it.
    User(UserSymbol),
}

/// Built-in registry plus user namespace: the resolution context for one
/// configuration load.
#[derive(Debug, Clone)]
pub struct TransformCatalog {
    builtins: Arc<BuiltinRegistry>,
    user: UserNamespace,
}

impl Default for TransformCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TransformCatalog {
    /// Catalog over an existing built-in registry.
    pub fn new(builtins: Arc<BuiltinRegistry>) -> Self {
        Self {
            builtins,
            user: UserNamespace::new(),
        }
    }

    /// Catalog over [`BuiltinRegistry::with_builtins`].
    pub fn with_builtins() -> Self {
        Self::new(Arc::new(BuiltinRegistry::with_builtins()))
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn user_namespace(&self) -> &UserNamespace {
        &self.user
    }

    /// Resolve a name. Always succeeds.
    pub fn resolve(&mut self, name: &str, overrides: Option<&OverrideTable>) -> Resolved {
        if let Some(value) = overrides.and_then(|o| o.get(name)) {
            debug!("Transform name {:?} resolved via override table", name);
            return Resolved::Value {
                name: normalize(name),
                value: value.clone(),
            };
        }

        if let Some(transform) = self.builtins.get_function(name) {
            debug!("Transform name {:?} resolved to built-in function", name);
            return Resolved::Builtin(transform.clone());
        }

        let symbol = self.user.intern(name);
        debug!("Transform name {:?} interned as user symbol {}", name, symbol);
        Resolved::User(symbol)
    }

    /// Declare a user transform under `name`.
    ///
    /// A name equal to a built-in function would never resolve to the user
    /// binding, so it is rejected as a configuration error.
    pub fn define(&mut self, name: &str, transform: Transform) -> Result<UserSymbol> {
        if self.builtins.has_function(name) {
            return Err(TransformError::Config(format!(
                "User transform '{}' shadows a built-in transform of the same name",
                name
            )));
        }
        let symbol = self.user.intern(name);
        self.user.bind(&symbol, transform.renamed(symbol.name()));
        Ok(symbol)
    }

    /// Turn a resolution into a stable callable handle.
    ///
    /// Overrides become a transform that ignores its argument and returns the
    /// fixed value. Unbound user symbols are an error.
    pub fn callable(&self, resolved: &Resolved) -> Result<Transform> {
        match resolved {
            Resolved::Value { name, value } => {
                let value = value.clone();
                Ok(Transform::unary(name.as_str(), move |_| Ok(value.clone())))
            }
            Resolved::Builtin(t) => Ok(t.clone()),
            Resolved::User(sym) => self
                .user
                .lookup(sym)
                .cloned()
                .ok_or_else(|| TransformError::Unbound(sym.to_string())),
        }
    }

    /// Resolve and bind in one step.
    pub fn require(&mut self, name: &str, overrides: Option<&OverrideTable>) -> Result<Transform> {
        let resolved = self.resolve(name, overrides);
        self.callable(&resolved)
    }

    /// Invoke a resolution directly.
    pub fn invoke(&self, resolved: &Resolved, args: &[RawValue<'_>]) -> Result<Encoded> {
        match resolved {
            Resolved::Value { value, .. } => Ok(value.clone()),
            _ => self.callable(resolved)?.apply(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shout() -> Transform {
        Transform::unary("shout", |v| match v {
            RawValue::Text(s) => Ok(Encoded::Text(s.to_uppercase())),
            _ => Ok(Encoded::Null),
        })
    }

    #[test]
    fn test_builtin_function_resolves_to_function() {
        let mut catalog = TransformCatalog::with_builtins();
        match catalog.resolve("Tinyint-To-Boolean", None) {
            Resolved::Builtin(t) => assert_eq!(t.name(), "tinyint-to-boolean"),
            other => panic!("expected builtin, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_name_resolves_to_user_symbol() {
        let mut catalog = TransformCatalog::with_builtins();
        assert!(catalog.builtins().is_reserved("true"));

        match catalog.resolve("TRUE", None) {
            Resolved::User(sym) => assert_eq!(sym.name(), "true"),
            other => panic!("expected user symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut catalog = TransformCatalog::with_builtins();
        let overrides = OverrideTable::with_null_literals()
            .with("right-trim", Encoded::text("fixed"));

        assert!(matches!(
            catalog.resolve("NIL", Some(&overrides)),
            Resolved::Value {
                value: Encoded::Null,
                ..
            }
        ));
        assert!(matches!(
            catalog.resolve("right-trim", Some(&overrides)),
            Resolved::Value {
                value: Encoded::Text(ref s),
                ..
            } if s == "fixed"
        ));
        assert!(matches!(
            catalog.resolve("right-trim", None),
            Resolved::Builtin(_)
        ));
    }

    #[test]
    fn test_user_symbols_are_interned() {
        let mut ns = UserNamespace::new();
        let a = ns.intern("My-Transform");
        let b = ns.intern("my-transform");
        assert_eq!(a, b);
        assert!(!ns.is_bound(&a));
    }

    #[test]
    fn test_user_definition_is_callable() {
        let mut catalog = TransformCatalog::with_builtins();
        catalog.define("shout", shout()).unwrap();

        let resolved = catalog.resolve("SHOUT", None);
        assert!(matches!(resolved, Resolved::User(_)));
        assert_eq!(
            catalog.invoke(&resolved, &["hi".into()]).unwrap(),
            Encoded::text("HI")
        );
    }

    #[test]
    fn test_user_definition_on_reserved_name() {
        let mut catalog = TransformCatalog::with_builtins();
        catalog.define("true", shout()).unwrap();
        let t = catalog.require("true", None).unwrap();
        assert_eq!(t.apply_one(&"x".into()).unwrap(), Encoded::text("X"));
    }

    #[test]
    fn test_user_definition_cannot_shadow_builtin() {
        let mut catalog = TransformCatalog::with_builtins();
        let err = catalog.define("right-trim", shout()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_unbound_user_symbol() {
        let mut catalog = TransformCatalog::with_builtins();
        let resolved = catalog.resolve("not-defined-anywhere", None);
        let err = catalog.invoke(&resolved, &[RawValue::Null]).unwrap_err();
        assert!(matches!(err, TransformError::Unbound(ref n) if n == "not-defined-anywhere"));
    }

    #[test]
    fn test_override_callable_ignores_argument() {
        let mut catalog = TransformCatalog::with_builtins();
        let overrides = OverrideTable::with_null_literals();
        let t = catalog.require("NIL", Some(&overrides)).unwrap();
        assert_eq!(t.apply_one(&"anything".into()).unwrap(), Encoded::Null);
    }

    #[test]
    fn test_override_handle_keeps_its_name() {
        let mut catalog = TransformCatalog::with_builtins();
        let overrides = OverrideTable::new().with("Blank", Encoded::text(""));
        let t = catalog.require("blank", Some(&overrides)).unwrap();
        assert_eq!(t.name(), "blank");
        assert_eq!(t.apply_one(&"x".into()).unwrap(), Encoded::text(""));
    }

    #[test]
    fn test_function_names() {
        let registry = BuiltinRegistry::with_builtins();
        let names = registry.function_names();
        assert!(names.contains(&"zero-dates-to-null"));
        assert!(names.contains(&"ip-range"));
        assert!(!names.contains(&"nil"));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}
