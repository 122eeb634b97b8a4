//! Configuration type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encode::FieldSpec;
use crate::predicate::TypmodExpr;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// WHATWG label of the source character set, used by
    /// `varbinary-to-string` (default: utf-8).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_encoding: Option<String>,

    /// Literal transform names forced to a fixed result. `~` means NULL.
    ///
    /// Added on top of the default `nil`/`null` entries.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Option<String>>,

    /// User-defined transforms, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transforms: BTreeMap<String, UserTransformConfig>,

    /// Cast rules, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleConfig>,
}

/// A user-defined transform.
///
/// Each form rejects keys it does not know, so a misspelled key or a
/// definition mixing both forms fails to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserTransformConfig {
    Chain(ChainConfig),
    Builtin(BuiltinAliasConfig),
}

/// Apply transforms left to right. NULL or an indeterminate result stops
/// the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub chain: Vec<String>,
}

/// A built-in under another name, optionally re-parameterised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuiltinAliasConfig {
    pub builtin: String,

    /// Field layout for `date-with-no-separator` or
    /// `time-with-no-separator`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Vec<FieldSpec>>,

    /// Encoding label for `varbinary-to-string`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl UserTransformConfig {
    /// Chain of the named steps.
    pub fn chain<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UserTransformConfig::Chain(ChainConfig {
            chain: steps.into_iter().map(Into::into).collect(),
        })
    }

    /// Plain alias of a built-in.
    pub fn builtin(name: impl Into<String>) -> Self {
        UserTransformConfig::Builtin(BuiltinAliasConfig {
            builtin: name.into(),
            layout: None,
            encoding: None,
        })
    }
}

/// One cast rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Source data type tag, matched case-insensitively.
    #[serde(rename = "type")]
    pub data_type: String,

    /// Optional typmod predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<WhenConfig>,

    /// Transform name to run for matching columns.
    pub transform: String,
}

/// A typmod predicate, written as text or as an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhenConfig {
    Text(String),
    Tree(TypmodExpr),
}

impl WhenConfig {
    /// Parse into an expression tree.
    pub fn to_expr(&self) -> crate::error::Result<TypmodExpr> {
        match self {
            WhenConfig::Text(text) => TypmodExpr::parse(text),
            WhenConfig::Tree(expr) => Ok(expr.clone()),
        }
    }
}
