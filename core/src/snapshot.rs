//! # Validated Config Snapshot
//!
//! One immutable, fully validated configuration produced by a single
//! load/reload cycle. Snapshots are cheap to clone (`Arc`-shared) and a new
//! snapshot atomically replaces the old one on reload — readers never see a
//! partially-updated one.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::file_loader::RawMap;

/// Immutable view over the validated values of one load cycle.
///
/// The contract is read-only by construction: accessors hand out references
/// or owned conversions, never mutable access.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    values: Arc<RawMap>,
}

impl ConfigSnapshot {
    pub(crate) fn new(values: RawMap) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Deserializes one key into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Deserializes the whole snapshot into a caller-declared struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let object: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        serde_json::from_value(Value::Object(object))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn values(&self) -> &RawMap {
        &self.values
    }

    /// Whether two snapshots share the same underlying allocation.
    ///
    /// Two back-to-back `reload()` calls with unchanged sources produce
    /// value-equal but independently constructed snapshots; this
    /// distinguishes the two cases in tests.
    pub fn ptr_eq(&self, other: &ConfigSnapshot) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl PartialEq for ConfigSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot::new(RawMap::from([
            ("host".to_string(), json!("localhost")),
            ("port".to_string(), json!(8080)),
            ("debug".to_string(), json!(true)),
            ("ratio".to_string(), json!(0.5)),
        ]))
    }

    #[test]
    fn test_typed_accessors() {
        let snapshot = snapshot();
        assert_eq!(snapshot.get_str("host"), Some("localhost"));
        assert_eq!(snapshot.get_i64("port"), Some(8080));
        assert_eq!(snapshot.get_bool("debug"), Some(true));
        assert_eq!(snapshot.get_f64("ratio"), Some(0.5));
        assert_eq!(snapshot.get_str("missing"), None);
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(serde::Deserialize)]
        struct Typed {
            host: String,
            port: u16,
        }

        let typed: Typed = snapshot().deserialize().unwrap();
        assert_eq!(typed.host, "localhost");
        assert_eq!(typed.port, 8080);
    }

    #[test]
    fn test_clone_shares_storage() {
        let a = snapshot();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_equality_across_independent_snapshots() {
        let a = snapshot();
        let b = snapshot();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }
}
