//! Configuration loading and validation.
//!
//! A YAML document declares the override table, user transforms and cast
//! rules. [`TransformConfig::build`] resolves every name and compiles every
//! predicate up front, so all configuration errors surface at load time and
//! never while rows are being encoded.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use tracing::debug;

use crate::core::{Encoded, RawValue, Transform};
use crate::encode::binary::{varbinary_to_string, VARBINARY_TO_STRING};
use crate::encode::date::{
    date_with_no_separator, time_with_no_separator, DATE_WITH_NO_SEPARATOR,
    TIME_WITH_NO_SEPARATOR,
};
use crate::encode::{FieldLayout, SourceEncoding};
use crate::error::{Result, TransformError};
use crate::rules::TransformSet;

impl TransformConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string. An empty document is the
    /// empty configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TransformConfig = if yaml.trim().is_empty() {
            TransformConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Resolve names, define user transforms and compile rules.
    pub fn build(&self) -> Result<TransformSet> {
        let encoding = match &self.source_encoding {
            Some(label) => SourceEncoding::from_label(label)?,
            None => SourceEncoding::default(),
        };
        let mut set = TransformSet::new(encoding);

        for (name, value) in &self.overrides {
            set.overrides_mut().insert(name, Encoded::from(value.clone()));
        }

        self.define_transforms(&mut set)?;

        for (i, rule) in self.rules.iter().enumerate() {
            let predicate = match &rule.when {
                Some(when) => Some(when.to_expr()?.compile()?),
                None => None,
            };
            set.add_rule(&rule.data_type, predicate, &rule.transform)
                .map_err(|e| match e {
                    TransformError::Unbound(name) => TransformError::Config(format!(
                        "rules[{}]: transform '{}' is not defined",
                        i, name
                    )),
                    other => other,
                })?;
        }

        debug!(
            "Loaded {} user transforms and {} rules",
            self.transforms.len(),
            set.rules().len()
        );
        Ok(set)
    }

    /// Define user transforms, deferring any whose steps name a user
    /// transform not yet defined.
    fn define_transforms(&self, set: &mut TransformSet) -> Result<()> {
        let mut pending: Vec<(&String, &UserTransformConfig)> = self.transforms.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            let mut missing = None;

            for (name, def) in pending {
                if set.overrides().get(name).is_some() {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: name is taken by an override",
                        name
                    )));
                }
                match build_user_transform(set, name, def) {
                    Ok(transform) => {
                        set.catalog_mut().define(name, transform)?;
                        debug!("Defined user transform {}", name);
                    }
                    Err(TransformError::Unbound(step)) => {
                        missing = Some((name, step));
                        deferred.push((name, def));
                    }
                    Err(e) => return Err(e),
                }
            }

            if deferred.len() == before {
                if let Some((name, step)) = missing {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: step '{}' is not defined or is part of a cycle",
                        name, step
                    )));
                }
            }
            pending = deferred;
        }

        Ok(())
    }
}

fn build_user_transform(
    set: &mut TransformSet,
    name: &str,
    def: &UserTransformConfig,
) -> Result<Transform> {
    match def {
        UserTransformConfig::Builtin(BuiltinAliasConfig {
            builtin,
            layout,
            encoding,
        }) => {
            let Some(base) = set.catalog().builtins().get_function(builtin).cloned() else {
                return Err(TransformError::Config(format!(
                    "transforms.{}: '{}' is not a built-in transform",
                    name, builtin
                )));
            };

            if let Some(fields) = layout {
                return match base.name() {
                    DATE_WITH_NO_SEPARATOR => {
                        let layout = FieldLayout::for_date(fields.clone())?;
                        Ok(Transform::unary(name, move |v| {
                            date_with_no_separator(v, &layout)
                        }))
                    }
                    TIME_WITH_NO_SEPARATOR => {
                        let layout = FieldLayout::for_time(fields.clone())?;
                        Ok(Transform::unary(name, move |v| {
                            time_with_no_separator(v, &layout)
                        }))
                    }
                    other => Err(TransformError::Config(format!(
                        "transforms.{}: {} does not take a layout",
                        name, other
                    ))),
                };
            }

            if let Some(label) = encoding {
                if base.name() != VARBINARY_TO_STRING {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: {} does not take an encoding",
                        name,
                        base.name()
                    )));
                }
                let encoding = SourceEncoding::from_label(label)?;
                return Ok(Transform::unary(name, move |v| {
                    varbinary_to_string(v, encoding)
                }));
            }

            Ok(base.renamed(name))
        }
        UserTransformConfig::Chain(ChainConfig { chain }) => {
            let mut steps = Vec::with_capacity(chain.len());
            for step in chain {
                let transform = set.transform(step)?;
                if transform.arity() != 1 {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: chain step {} takes {} arguments, expected 1",
                        name,
                        transform.name(),
                        transform.arity()
                    )));
                }
                steps.push(transform);
            }
            Ok(chain_transform(name, steps))
        }
    }
}

/// Sequential composition. A NULL or indeterminate result ends the chain.
fn chain_transform(name: &str, steps: Vec<Transform>) -> Transform {
    Transform::unary(name, move |value| {
        let mut steps = steps.iter();
        let Some(first) = steps.next() else {
            return Ok(Encoded::Null);
        };
        let mut current = first.apply_one(value)?;
        for step in steps {
            let Encoded::Text(text) = current else {
                break;
            };
            current = step.apply_one(&RawValue::from(text))?;
        }
        Ok(current)
    })
}

impl TransformSet {
    /// Load, validate and build a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        TransformConfig::load(path)?.build()
    }
}
