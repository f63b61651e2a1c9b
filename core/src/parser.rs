//! # Schema Validation Pass
//!
//! Validates the merged raw map against the declared schema: per-key
//! validation and coercion, declared defaults for missing keys, and error
//! accumulation across all keys — a failure on one key never hides the
//! failures on the others.

use lamina_errors::{ConfigError, FieldFailure};

use crate::file_loader::RawMap;
use crate::reporter::render_report;
use crate::schema::Schema;

/// Result of a successful validation pass.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Validated, coerced values — the snapshot contents.
    pub values: RawMap,

    /// Keys whose validator declares a default and that landed in the
    /// snapshot. Recorded in the origin ledger as the first, lowest-priority
    /// source whether or not the default was the winning value.
    pub defaulted_keys: Vec<String>,
}

/// Validates the raw map against the schema.
///
/// For each declared key: a present value is validated (and, unless
/// `strict`, coerced) against its field validator; an absent or null value
/// falls back to the declared default, which is itself validated; an absent
/// value with no default on a non-optional field is a "required" failure.
/// A supplied value always wins over the default.
///
/// All failures are collected and returned as one aggregated
/// [`ConfigError::Validation`]; no partial result is produced.
pub fn parse_config(
    schema: &Schema,
    raw_values: &RawMap,
    strict: bool,
) -> Result<ParseOutcome, ConfigError> {
    let mut values = RawMap::new();
    let mut defaulted_keys = Vec::new();
    let mut failures = Vec::new();

    for (key, field) in schema.iter() {
        let raw = raw_values.get(key).filter(|value| !value.is_null());
        let default = field.validator.default().cloned();

        let (candidate, default_used) = match (raw, &default) {
            (Some(value), _) => (value.clone(), false),
            (None, Some(default_value)) => (default_value.clone(), true),
            (None, None) => {
                if !field.validator.is_optional() {
                    failures.push(FieldFailure {
                        key: key.to_string(),
                        received: None,
                        messages: vec!["This field is required.".to_string()],
                        default_used: false,
                        default_value: None,
                        description: field.description.clone(),
                    });
                }
                continue;
            }
        };

        match field.validator.validate(&candidate, strict) {
            Ok(validated) => {
                if default.is_some() {
                    defaulted_keys.push(key.to_string());
                }
                values.insert(key.to_string(), validated);
            }
            Err(messages) => {
                failures.push(FieldFailure {
                    key: key.to_string(),
                    received: raw.cloned(),
                    messages,
                    default_used,
                    default_value: default,
                    description: field.description.clone(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(ParseOutcome {
            values,
            defaulted_keys,
        })
    } else {
        let report = render_report(&failures);
        Err(ConfigError::Validation { failures, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldValidator, SchemaField};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .field("port", FieldValidator::integer().min(1.0).max(65535.0))
            .field(
                "host",
                SchemaField::new(FieldValidator::string()).description("Hostname to bind"),
            )
            .field(
                "log_level",
                FieldValidator::string()
                    .one_of(["trace", "debug", "info", "warn", "error"])
                    .default_value("info"),
            )
            .field("tags", FieldValidator::array().optional())
            .build()
    }

    #[test]
    fn test_valid_config_passes() {
        let raw = RawMap::from([
            ("port".to_string(), json!("8080")),
            ("host".to_string(), json!("localhost")),
        ]);

        let outcome = parse_config(&schema(), &raw, false).unwrap();

        assert_eq!(outcome.values.get("port"), Some(&json!(8080)));
        assert_eq!(outcome.values.get("host"), Some(&json!("localhost")));
        assert_eq!(outcome.values.get("log_level"), Some(&json!("info")));
        assert_eq!(outcome.defaulted_keys, vec!["log_level".to_string()]);
        assert!(!outcome.values.contains_key("tags"));
    }

    #[test]
    fn test_supplied_value_wins_over_default() {
        let raw = RawMap::from([
            ("port".to_string(), json!(1)),
            ("host".to_string(), json!("h")),
            ("log_level".to_string(), json!("debug")),
        ]);

        let outcome = parse_config(&schema(), &raw, false).unwrap();

        assert_eq!(outcome.values.get("log_level"), Some(&json!("debug")));
        // The default is still on record for origin bookkeeping.
        assert_eq!(outcome.defaulted_keys, vec!["log_level".to_string()]);
    }

    #[test]
    fn test_null_value_falls_back_to_default() {
        let raw = RawMap::from([
            ("port".to_string(), json!(1)),
            ("host".to_string(), json!("h")),
            ("log_level".to_string(), json!(null)),
        ]);

        let outcome = parse_config(&schema(), &raw, false).unwrap();
        assert_eq!(outcome.values.get("log_level"), Some(&json!("info")));
    }

    #[test]
    fn test_errors_accumulate_across_keys() {
        let raw = RawMap::from([("port".to_string(), json!("not-a-number"))]);

        let error = parse_config(&schema(), &raw, false).unwrap_err();
        let failures = error.field_failures();

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].key, "host");
        assert_eq!(failures[0].messages, vec!["This field is required.".to_string()]);
        assert_eq!(failures[0].description, Some("Hostname to bind".to_string()));
        assert_eq!(failures[1].key, "port");
        assert_eq!(failures[1].received, Some(json!("not-a-number")));

        let report = error.to_string();
        assert!(report.contains("port"));
        assert!(report.contains("host"));
    }

    #[test]
    fn test_default_is_validated_against_own_field() {
        let schema = Schema::builder()
            .field(
                "retries",
                FieldValidator::integer().min(1.0).default_value(0),
            )
            .build();

        let error = parse_config(&schema, &RawMap::new(), false).unwrap_err();
        let failures = error.field_failures();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "retries");
        assert!(failures[0].default_used);
        assert_eq!(failures[0].default_value, Some(json!(0)));
        assert_eq!(failures[0].received, None);
    }

    #[test]
    fn test_strict_mode_disables_coercion() {
        let raw = RawMap::from([
            ("port".to_string(), json!("8080")),
            ("host".to_string(), json!("h")),
        ]);

        let error = parse_config(&schema(), &raw, true).unwrap_err();
        assert_eq!(error.field_failures().len(), 1);
        assert_eq!(error.field_failures()[0].key, "port");
    }

    #[test]
    fn test_optional_missing_key_is_not_an_error() {
        let raw = RawMap::from([
            ("port".to_string(), json!(80)),
            ("host".to_string(), json!("h")),
        ]);

        let outcome = parse_config(&schema(), &raw, false).unwrap();
        assert!(!outcome.values.contains_key("tags"));
    }
}
