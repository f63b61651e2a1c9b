//! # Configuration Schema
//!
//! Declares the shape of a configuration: one [`FieldValidator`] per key,
//! optionally extended with a description, a sensitivity marker, a custom
//! redaction function and alternate environment key names.
//!
//! The schema is declared once at engine construction and is immutable for
//! the lifetime of the engine. Raw values are `serde_json::Value`s; each
//! field validator checks (and in non-strict mode coerces) the raw value
//! into its declared type.

use std::collections::BTreeMap;

use serde_json::Value;

/// Declared type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn describe(self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Integer => "an integer",
            FieldType::Float => "a number",
            FieldType::Boolean => "a boolean",
            FieldType::Array => "an array",
            FieldType::Object => "an object",
        }
    }
}

/// Validator for a single configuration field.
///
/// Built with the typed constructors ([`FieldValidator::string`],
/// [`FieldValidator::integer`], ...) and refined with builder methods:
///
/// ```rust
/// use lamina::FieldValidator;
///
/// let port = FieldValidator::integer().min(1.0).max(65535.0).default_value(8080);
/// let log_level = FieldValidator::string().one_of(["trace", "debug", "info", "warn", "error"]);
/// ```
#[derive(Debug, Clone)]
pub struct FieldValidator {
    kind: FieldType,
    default: Option<Value>,
    optional: bool,
    min: Option<f64>,
    max: Option<f64>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    one_of: Option<Vec<String>>,
    custom: Option<fn(&Value) -> Result<(), String>>,
}

impl FieldValidator {
    fn new(kind: FieldType) -> Self {
        Self {
            kind,
            default: None,
            optional: false,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
            one_of: None,
            custom: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn array() -> Self {
        Self::new(FieldType::Array)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    /// Declared default, applied when no source supplies the key.
    ///
    /// The default itself is validated against this validator when applied.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the field optional: a missing value without a default is not an
    /// error, and the key is omitted from the snapshot.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Inclusive lower bound for integer/float fields.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound for integer/float fields.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Minimum length for string fields.
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Maximum length for string fields.
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Restricts a string field to a fixed set of values.
    pub fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Custom check, run after the type check on the coerced value.
    pub fn custom(mut self, check: fn(&Value) -> Result<(), String>) -> Self {
        self.custom = Some(check);
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Validates a raw value against this field.
    ///
    /// In non-strict mode a permissive coercion pass runs first, so
    /// stringified booleans and numbers from environment variables satisfy
    /// their declared type. In strict mode the raw value must already match.
    ///
    /// Returns the coerced value or the full list of violation messages.
    pub fn validate(&self, value: &Value, strict: bool) -> Result<Value, Vec<String>> {
        let candidate = if strict {
            value.clone()
        } else {
            self.coerce(value)
        };

        let mut messages = Vec::new();

        if !self.matches_type(&candidate) {
            messages.push(format!(
                "Expected {}, received {}.",
                self.kind.describe(),
                describe_value(value)
            ));
            return Err(messages);
        }

        self.check_bounds(&candidate, &mut messages);

        if let Some(check) = self.custom {
            if let Err(message) = check(&candidate) {
                messages.push(message);
            }
        }

        if messages.is_empty() {
            Ok(candidate)
        } else {
            Err(messages)
        }
    }

    /// Permissive coercion of raw values toward the declared type.
    ///
    /// Environment variables only ever supply strings, so string inputs are
    /// parsed into numbers, booleans and (as JSON) arrays/objects. Scalar
    /// inputs for string fields are rendered back to text. Values that do not
    /// coerce are returned unchanged and fail the type check instead.
    fn coerce(&self, value: &Value) -> Value {
        match (self.kind, value) {
            (FieldType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
            (FieldType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
            (FieldType::Float, Value::Number(_)) => value.clone(),
            (FieldType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => value.clone(),
            },
            (FieldType::String, Value::Number(n)) => Value::String(n.to_string()),
            (FieldType::String, Value::Bool(b)) => Value::String(b.to_string()),
            (FieldType::Array | FieldType::Object, Value::String(s)) => {
                serde_json::from_str::<Value>(s).unwrap_or_else(|_| value.clone())
            }
            _ => value.clone(),
        }
    }

    fn matches_type(&self, value: &Value) -> bool {
        match self.kind {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }

    fn check_bounds(&self, value: &Value, messages: &mut Vec<String>) {
        if let Some(number) = value.as_f64() {
            if let Some(min) = self.min {
                if number < min {
                    messages.push(format!("Value must be greater than or equal to {min}."));
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    messages.push(format!("Value must be less than or equal to {max}."));
                }
            }
        }

        if let Some(text) = value.as_str() {
            if let Some(min_len) = self.min_len {
                if text.chars().count() < min_len {
                    messages.push(format!("Value must be at least {min_len} characters."));
                }
            }
            if let Some(max_len) = self.max_len {
                if text.chars().count() > max_len {
                    messages.push(format!("Value must be at most {max_len} characters."));
                }
            }
            if let Some(allowed) = &self.one_of {
                if !allowed.iter().any(|candidate| candidate == text) {
                    messages.push(format!("Value must be one of: {}.", allowed.join(", ")));
                }
            }
        }
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(s) => format!("the string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

/// One schema entry: a validator plus presentation and lookup metadata.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub validator: FieldValidator,

    /// Human description, included in validation failure reports.
    pub description: Option<String>,

    /// Sensitive fields are replaced by the redactor in display output.
    pub sensitive: bool,

    /// Custom redaction function; implies `sensitive`.
    pub redactor: Option<fn(&Value) -> String>,

    /// Additional environment variable names that may supply this key.
    pub alternate_keys: Vec<String>,
}

impl SchemaField {
    pub fn new(validator: FieldValidator) -> Self {
        Self {
            validator,
            description: None,
            sensitive: false,
            redactor: None,
            alternate_keys: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn redact_with(mut self, redactor: fn(&Value) -> String) -> Self {
        self.redactor = Some(redactor);
        self
    }

    pub fn alternate_key(mut self, key: impl Into<String>) -> Self {
        self.alternate_keys.push(key.into());
        self
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive || self.redactor.is_some()
    }
}

impl From<FieldValidator> for SchemaField {
    fn from(validator: FieldValidator) -> Self {
        SchemaField::new(validator)
    }
}

/// The declared configuration schema: key → field.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, SchemaField>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&SchemaField> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.fields.iter().map(|(key, field)| (key.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: BTreeMap<String, SchemaField>,
}

impl SchemaBuilder {
    /// Adds a field. Accepts a bare [`FieldValidator`] or a full
    /// [`SchemaField`]; a later field with the same key replaces the earlier.
    pub fn field(mut self, key: impl Into<String>, field: impl Into<SchemaField>) -> Self {
        self.fields.insert(key.into(), field.into());
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_integer_accepts_number() {
        let validator = FieldValidator::integer();
        assert_eq!(validator.validate(&json!(8080), false).unwrap(), json!(8080));
    }

    #[test]
    fn test_validate_integer_coerces_string() {
        let validator = FieldValidator::integer();
        assert_eq!(validator.validate(&json!("8080"), false).unwrap(), json!(8080));
    }

    #[test]
    fn test_validate_integer_strict_rejects_string() {
        let validator = FieldValidator::integer();
        let messages = validator.validate(&json!("8080"), true).unwrap_err();
        assert!(messages[0].contains("Expected an integer"));
    }

    #[test]
    fn test_validate_boolean_coercions() {
        let validator = FieldValidator::boolean();
        assert_eq!(validator.validate(&json!("true"), false).unwrap(), json!(true));
        assert_eq!(validator.validate(&json!("0"), false).unwrap(), json!(false));
        assert!(validator.validate(&json!("yes"), false).is_err());
    }

    #[test]
    fn test_validate_string_coerces_scalars() {
        let validator = FieldValidator::string();
        assert_eq!(validator.validate(&json!(42), false).unwrap(), json!("42"));
        assert_eq!(validator.validate(&json!(true), false).unwrap(), json!("true"));
    }

    #[test]
    fn test_validate_bounds_collects_all_messages() {
        let validator = FieldValidator::integer().min(10.0).max(20.0);
        let messages = validator.validate(&json!(5), false).unwrap_err();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("greater than or equal to 10"));
    }

    #[test]
    fn test_validate_one_of() {
        let validator = FieldValidator::string().one_of(["debug", "info"]);
        assert!(validator.validate(&json!("info"), false).is_ok());
        let messages = validator.validate(&json!("verbose"), false).unwrap_err();
        assert!(messages[0].contains("one of: debug, info"));
    }

    #[test]
    fn test_validate_string_length_bounds() {
        let validator = FieldValidator::string().min_len(2).max_len(4);
        assert!(validator.validate(&json!("abc"), false).is_ok());
        assert!(validator.validate(&json!("a"), false).is_err());
        assert!(validator.validate(&json!("abcde"), false).is_err());
    }

    #[test]
    fn test_validate_array_from_json_string() {
        let validator = FieldValidator::array();
        assert_eq!(
            validator.validate(&json!("[1, 2, 3]"), false).unwrap(),
            json!([1, 2, 3])
        );
        assert!(validator.validate(&json!("[1, 2, 3]"), true).is_err());
    }

    #[test]
    fn test_validate_custom_check() {
        fn even(value: &Value) -> Result<(), String> {
            match value.as_i64() {
                Some(n) if n % 2 == 0 => Ok(()),
                _ => Err("Value must be even.".to_string()),
            }
        }

        let validator = FieldValidator::integer().custom(even);
        assert!(validator.validate(&json!(4), false).is_ok());
        let messages = validator.validate(&json!(3), false).unwrap_err();
        assert_eq!(messages, vec!["Value must be even.".to_string()]);
    }

    #[test]
    fn test_schema_builder_replaces_duplicate_keys() {
        let schema = Schema::builder()
            .field("port", FieldValidator::integer())
            .field("port", FieldValidator::integer().default_value(8080))
            .build();

        assert_eq!(schema.len(), 1);
        assert_eq!(
            schema.get("port").unwrap().validator.default(),
            Some(&json!(8080))
        );
    }

    #[test]
    fn test_schema_field_sensitivity() {
        fn last_four(_: &Value) -> String {
            "****".to_string()
        }

        let plain: SchemaField = FieldValidator::string().into();
        assert!(!plain.is_sensitive());

        let marked = SchemaField::new(FieldValidator::string()).sensitive();
        assert!(marked.is_sensitive());

        let custom = SchemaField::new(FieldValidator::string()).redact_with(last_four);
        assert!(custom.is_sensitive());
    }
}
