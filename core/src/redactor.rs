//! # Redaction
//!
//! Derives a display-safe copy of validated values: fields the schema marks
//! sensitive (or that carry a custom redaction function) are replaced with
//! a placeholder. Values that are already empty or falsy pass through
//! unredacted; there is nothing sensitive left to hide in them.

use serde_json::Value;

use crate::file_loader::RawMap;
use crate::schema::Schema;

/// Placeholder substituted for sensitive values without a custom redactor.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Returns a redacted copy of `values`; the input is never mutated.
pub fn redact_config(schema: &Schema, values: &RawMap) -> RawMap {
    let mut redacted = RawMap::new();

    for (key, value) in values {
        let field = schema.get(key);
        let sensitive = field.is_some_and(|f| f.is_sensitive());

        let output = if sensitive && !is_falsy(value) {
            match field.and_then(|f| f.redactor) {
                Some(redactor) => Value::String(redactor(value)),
                None => Value::String(REDACTED_PLACEHOLDER.to_string()),
            }
        } else {
            value.clone()
        };

        redacted.insert(key.clone(), output);
    }

    redacted
}
