//! Cast rules and the loaded transform set.
//!
//! A [`CastRule`] binds a source data type, optionally narrowed by a typmod
//! predicate, to a resolved [`Transform`]. [`CastRules::select`] picks the
//! first rule that applies to a column. Everything is resolved and compiled
//! once, when the [`TransformSet`] is built.

use tracing::{debug, trace};

use crate::core::{
    BuiltinRegistry, Encoded, OverrideTable, RawValue, Resolved, Transform, TransformCatalog,
};
use crate::encode::binary::{varbinary_to_string, VARBINARY_TO_STRING};
use crate::encode::SourceEncoding;
use crate::error::{Result, TransformError};
use crate::predicate::TypmodPredicate;
use crate::typmod::{parse_typmod, Typmod};

/// One type-directed cast rule.
#[derive(Debug, Clone)]
pub struct CastRule {
    data_type: String,
    predicate: Option<TypmodPredicate>,
    transform: Transform,
}

impl CastRule {
    pub fn new(
        data_type: impl Into<String>,
        predicate: Option<TypmodPredicate>,
        transform: Transform,
    ) -> Self {
        Self {
            data_type: data_type.into(),
            predicate,
            transform,
        }
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn predicate(&self) -> Option<&TypmodPredicate> {
        self.predicate.as_ref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Check whether the rule applies. A rule with a predicate never matches
    /// a column without a typmod.
    pub fn matches(&self, data_type: &str, typmod: Option<&Typmod>) -> bool {
        if !self.data_type.eq_ignore_ascii_case(data_type.trim()) {
            return false;
        }
        match (&self.predicate, typmod) {
            (None, _) => true,
            (Some(pred), Some(typmod)) => pred.matches(typmod),
            (Some(_), None) => false,
        }
    }

    /// Encode one field, tagging any error with its column and row.
    pub fn encode(&self, column: &str, row: u64, value: &RawValue<'_>) -> Result<Encoded> {
        self.transform
            .apply_one(value)
            .map_err(|e| e.in_column(column, row))
    }
}

/// Ordered list of cast rules. Earlier rules win.
#[derive(Debug, Clone, Default)]
pub struct CastRules {
    rules: Vec<CastRule>,
}

impl CastRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: CastRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CastRule> {
        self.rules.iter()
    }

    /// First rule applying to a column with an already-parsed typmod.
    pub fn select_typmod(&self, data_type: &str, typmod: Option<&Typmod>) -> Option<&CastRule> {
        let selected = self.rules.iter().find(|r| r.matches(data_type, typmod));
        trace!(
            "Rule selection for {} {:?}: {:?}",
            data_type,
            typmod,
            selected.map(|r| r.transform.name())
        );
        selected
    }

    /// First rule applying to a column, parsing its declaration for a typmod.
    pub fn select(&self, data_type: &str, column_type: &str) -> Result<Option<&CastRule>> {
        let typmod = parse_typmod(data_type, column_type)?;
        Ok(self.select_typmod(data_type, typmod.as_ref()))
    }
}

/// Everything needed to encode columns for one configuration load: the
/// built-in registry, user transforms, override table and compiled rules.
#[derive(Debug, Clone)]
pub struct TransformSet {
    catalog: TransformCatalog,
    overrides: OverrideTable,
    rules: CastRules,
    source_encoding: SourceEncoding,
}

impl Default for TransformSet {
    fn default() -> Self {
        Self::new(SourceEncoding::default())
    }
}

impl TransformSet {
    /// Built-ins only, with `nil`/`null` overridden to NULL.
    ///
    /// `varbinary-to-string` decodes with `source_encoding`.
    pub fn new(source_encoding: SourceEncoding) -> Self {
        let mut builtins = BuiltinRegistry::with_builtins();
        builtins.register(Transform::unary(VARBINARY_TO_STRING, move |v| {
            varbinary_to_string(v, source_encoding)
        }));
        debug!(
            "Transform set created with {} built-ins, source encoding {}",
            builtins.function_names().len(),
            source_encoding.name()
        );
        Self {
            catalog: TransformCatalog::new(builtins.into()),
            overrides: OverrideTable::with_null_literals(),
            rules: CastRules::new(),
            source_encoding,
        }
    }

    pub fn catalog(&self) -> &TransformCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TransformCatalog {
        &mut self.catalog
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut OverrideTable {
        &mut self.overrides
    }

    pub fn rules(&self) -> &CastRules {
        &self.rules
    }

    pub fn source_encoding(&self) -> SourceEncoding {
        self.source_encoding
    }

    /// Resolve a name against overrides, built-ins and the user namespace.
    pub fn resolve(&mut self, name: &str) -> Resolved {
        self.catalog.resolve(name, Some(&self.overrides))
    }

    /// Resolve a name to a callable transform.
    pub fn transform(&mut self, name: &str) -> Result<Transform> {
        self.catalog.require(name, Some(&self.overrides))
    }

    /// Resolve `transform` and append a rule for `data_type`.
    pub fn add_rule(
        &mut self,
        data_type: &str,
        predicate: Option<TypmodPredicate>,
        transform: &str,
    ) -> Result<()> {
        let transform = self.transform(transform)?;
        if transform.arity() != 1 {
            return Err(TransformError::Config(format!(
                "Rule for {} uses {}, which takes {} arguments; rules pass exactly one",
                data_type,
                transform.name(),
                transform.arity()
            )));
        }
        debug!(
            "Rule {} {} -> {}",
            data_type,
            predicate
                .as_ref()
                .map(|p| format!("when {}", p))
                .unwrap_or_default(),
            transform.name()
        );
        self.rules.push(CastRule::new(data_type, predicate, transform));
        Ok(())
    }

    /// See [`CastRules::select`].
    pub fn select(&self, data_type: &str, column_type: &str) -> Result<Option<&CastRule>> {
        self.rules.select(data_type, column_type)
    }
}
