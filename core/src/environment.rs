//! # Environment Variable Source
//!
//! Resolves the environment name and loads schema keys from process
//! environment variables.
//!
//! Matching is case-sensitive on the exact key first, then on a
//! SCREAMING_SNAKE transform of the key, then on any alternate key names the
//! schema declares. Only variables with a defined, non-empty value
//! participate.

use std::env;

use serde_json::Value;

use crate::file_loader::RawMap;
use crate::schema::Schema;

/// Environment name used when the configured variable is unset or empty.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Origin identifier recorded for values loaded from the process environment.
pub const ENVIRONMENT_ORIGIN: &str = "environment";

/// Resolves the environment name from the configured variable.
///
/// Falls back to [`DEFAULT_ENVIRONMENT`] with a warning when the variable is
/// unset or empty; the environment-named config file (`config.<name>.*`) is
/// resolved from this value.
pub fn environment_name(env_key: &str) -> String {
    match env::var(env_key) {
        Ok(name) if !name.is_empty() => name,
        _ => {
            tracing::warn!(
                "Unable to load environment from {env_key}. Defaulting to `{DEFAULT_ENVIRONMENT}`."
            );
            DEFAULT_ENVIRONMENT.to_string()
        }
    }
}

/// Loads values for schema keys from process environment variables.
///
/// For each schema key the candidates are tried in order: the exact key, its
/// SCREAMING_SNAKE form, then declared alternate keys. The first candidate
/// with a defined non-empty value wins. Values arrive as strings; coercion
/// to the declared field type happens later in the validation pass.
pub fn load_environment(schema: &Schema) -> RawMap {
    let mut values = RawMap::new();

    for (key, field) in schema.iter() {
        let mut candidates = vec![key.to_string(), constant_case(key)];
        candidates.extend(field.alternate_keys.iter().cloned());

        for candidate in candidates {
            if let Ok(value) = env::var(&candidate) {
                if !value.is_empty() {
                    values.insert(key.to_string(), Value::String(value));
                    break;
                }
            }
        }
    }

    values
}

/// SCREAMING_SNAKE transform: `logLevel` and `log-level` both become
/// `LOG_LEVEL`.
pub fn constant_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower_or_digit = false;

    for c in key.chars() {
        if c == '-' || c == '_' || c == '.' || c == ' ' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else if c.is_uppercase() {
            if prev_lower_or_digit && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_uppercase());
            prev_lower_or_digit = false;
        } else {
            out.extend(c.to_uppercase());
            prev_lower_or_digit = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    out
}
