//! Configuration validation.
//!
//! Structural checks that need no registry. Name resolution and predicate
//! compilation happen in [`TransformConfig::build`](super::TransformConfig::build).

use super::{BuiltinAliasConfig, ChainConfig, TransformConfig, UserTransformConfig};
use crate::encode::binary::VARBINARY_TO_STRING;
use crate::encode::date::{DATE_WITH_NO_SEPARATOR, TIME_WITH_NO_SEPARATOR};
use crate::encode::{FieldLayout, SourceEncoding};
use crate::error::{Result, TransformError};

/// Validate the configuration.
pub fn validate(config: &TransformConfig) -> Result<()> {
    if let Some(label) = &config.source_encoding {
        SourceEncoding::from_label(label)?;
    }

    for name in config.overrides.keys() {
        if name.trim().is_empty() {
            return Err(TransformError::Config(
                "overrides: names must not be empty".into(),
            ));
        }
    }

    for (name, transform) in &config.transforms {
        if name.trim().is_empty() {
            return Err(TransformError::Config(
                "transforms: names must not be empty".into(),
            ));
        }
        validate_transform(name, transform)?;
    }

    for (i, rule) in config.rules.iter().enumerate() {
        if rule.data_type.trim().is_empty() {
            return Err(TransformError::Config(format!(
                "rules[{}].type is required",
                i
            )));
        }
        if rule.transform.trim().is_empty() {
            return Err(TransformError::Config(format!(
                "rules[{}].transform is required",
                i
            )));
        }
        if let Some(when) = &rule.when {
            when.to_expr()?.validate()?;
        }
    }

    Ok(())
}

fn validate_transform(name: &str, transform: &UserTransformConfig) -> Result<()> {
    match transform {
        UserTransformConfig::Chain(ChainConfig { chain }) => {
            if chain.is_empty() {
                return Err(TransformError::Config(format!(
                    "transforms.{}: chain must have at least one step",
                    name
                )));
            }
            if chain.iter().any(|step| step.trim().eq_ignore_ascii_case(name.trim())) {
                return Err(TransformError::Config(format!(
                    "transforms.{}: chain refers to itself",
                    name
                )));
            }
        }
        UserTransformConfig::Builtin(BuiltinAliasConfig {
            builtin,
            layout,
            encoding,
        }) => {
            let builtin = builtin.trim();
            if let Some(fields) = layout {
                if builtin.eq_ignore_ascii_case(DATE_WITH_NO_SEPARATOR) {
                    FieldLayout::for_date(fields.clone())?;
                } else if builtin.eq_ignore_ascii_case(TIME_WITH_NO_SEPARATOR) {
                    FieldLayout::for_time(fields.clone())?;
                } else {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: layout is only valid for {} and {}",
                        name, DATE_WITH_NO_SEPARATOR, TIME_WITH_NO_SEPARATOR
                    )));
                }
            }
            if let Some(label) = encoding {
                if !builtin.eq_ignore_ascii_case(VARBINARY_TO_STRING) {
                    return Err(TransformError::Config(format!(
                        "transforms.{}: encoding is only valid for {}",
                        name, VARBINARY_TO_STRING
                    )));
                }
                SourceEncoding::from_label(label)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::encode::{DateField, FieldSpec};

    fn rule(data_type: &str, transform: &str) -> RuleConfig {
        RuleConfig {
            data_type: data_type.to_string(),
            when: None,
            transform: transform.to_string(),
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = TransformConfig::default();
        config.rules.push(rule("datetime", "zero-dates-to-null"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_encoding() {
        let config = TransformConfig {
            source_encoding: Some("klingon".into()),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rule_requires_type_and_transform() {
        let mut config = TransformConfig::default();
        config.rules.push(rule("", "right-trim"));
        assert!(validate(&config).is_err());

        let mut config = TransformConfig::default();
        config.rules.push(rule("char", " "));
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_chain() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "nothing".into(),
            UserTransformConfig::chain(Vec::<String>::new()),
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_self_referencing_chain() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "loop".into(),
            UserTransformConfig::chain(["right-trim", "LOOP"]),
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_layout_only_for_unseparated_dates() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "bad".into(),
            UserTransformConfig::Builtin(BuiltinAliasConfig {
                builtin: "right-trim".into(),
                layout: Some(vec![FieldSpec::new(DateField::Year, 0, 4)]),
                encoding: None,
            }),
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_layout_field() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "bad".into(),
            UserTransformConfig::Builtin(BuiltinAliasConfig {
                builtin: "date-with-no-separator".into(),
                layout: Some(vec![FieldSpec::new(DateField::Year, 4, 0)]),
                encoding: None,
            }),
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_date_layout_missing_day() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "year-month".into(),
            UserTransformConfig::Builtin(BuiltinAliasConfig {
                builtin: "date-with-no-separator".into(),
                layout: Some(vec![
                    FieldSpec::new(DateField::Year, 0, 4),
                    FieldSpec::new(DateField::Month, 4, 6),
                ]),
                encoding: None,
            }),
        );
        assert!(validate(&config).unwrap_err().is_config());
    }

    #[test]
    fn test_encoding_only_for_varbinary() {
        let mut config = TransformConfig::default();
        config.transforms.insert(
            "bad".into(),
            UserTransformConfig::Builtin(BuiltinAliasConfig {
                builtin: "base64-decode".into(),
                layout: None,
                encoding: Some("latin1".into()),
            }),
        );
        assert!(validate(&config).is_err());
    }
}
