//! # Configuration File Loading
//!
//! Resolves and parses config files into raw value maps.
//!
//! A file source is named by stem (`config.default`, `config.production`,
//! `config.local`); the loader tries each supported extension in order at
//! the base path and the first existing file wins. Supports TOML, YAML and
//! JSON, detected by extension.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

/// Raw key/value map produced by a single source.
pub type RawMap = BTreeMap<String, Value>;

/// Extensions tried when resolving a config file stem, in priority order.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}: {reason}")]
    TomlParse { path: String, reason: String },

    #[error("Failed to parse YAML in {path}: {reason}")]
    YamlParse { path: String, reason: String },

    #[error("Failed to parse JSON in {path}: {reason}")]
    JsonParse { path: String, reason: String },

    #[error("Config file {path} does not contain a table of values")]
    NotATable { path: String },

    #[error("Unsupported config file format: {path}")]
    UnsupportedFormat { path: String },
}

/// Resolves a config file stem against the supported extensions and parses
/// the first match.
///
/// Returns `Ok(None)` when no candidate file exists; that is the normal case
/// for optional files and is not an error. The returned name is the resolved
/// file name (stem plus extension) and is used as the origin identifier.
pub fn load_config_file(
    stem: &str,
    base_path: &Path,
) -> Result<Option<(String, RawMap)>, ConfigFileError> {
    for extension in SUPPORTED_EXTENSIONS {
        let file_name = format!("{stem}.{extension}");
        let path = base_path.join(&file_name);

        if path.is_file() {
            tracing::debug!(file = %file_name, "found config file");
            let values = load_file(&path)?;

            return Ok(Some((file_name, unwrap_default_table(values))));
        }
    }

    Ok(None)
}

/// Parses a single config file into a raw map, dispatching on extension.
pub fn load_file(path: &Path) -> Result<RawMap, ConfigFileError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: display.clone(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let value: Value = match extension.as_str() {
        "toml" => {
            let table: toml::Value =
                toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse {
                    path: display.clone(),
                    reason: e.to_string(),
                })?;
            serde_json::to_value(table).map_err(|e| ConfigFileError::TomlParse {
                path: display.clone(),
                reason: e.to_string(),
            })?
        }
        "yaml" | "yml" => {
            serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse {
                path: display.clone(),
                reason: e.to_string(),
            })?
        }
        "json" => serde_json::from_str(&contents).map_err(|e| ConfigFileError::JsonParse {
            path: display.clone(),
            reason: e.to_string(),
        })?,
        _ => return Err(ConfigFileError::UnsupportedFormat { path: display }),
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(ConfigFileError::NotATable { path: display }),
    }
}

/// Flattens a top-level `default` table into the root.
///
/// Mirrors unwrapping a module's default export: entries under `default`
/// land beside the named entries and win on collision.
fn unwrap_default_table(mut values: RawMap) -> RawMap {
    if let Some(Value::Object(defaults)) = values.remove("default") {
        for (key, value) in defaults {
            values.insert(key, value);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.default.toml"),
            "port = 8080\nhost = \"localhost\"\n",
        )
        .unwrap();

        let (name, values) = load_config_file("config.default", dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(name, "config.default.toml");
        assert_eq!(values.get("port"), Some(&json!(8080)));
        assert_eq!(values.get("host"), Some(&json!("localhost")));
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.production.yaml"),
            "port: 9090\nfeatures:\n  - alpha\n  - beta\n",
        )
        .unwrap();

        let (name, values) = load_config_file("config.production", dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(name, "config.production.yaml");
        assert_eq!(values.get("port"), Some(&json!(9090)));
        assert_eq!(values.get("features"), Some(&json!(["alpha", "beta"])));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.local.json"),
            r#"{"debug": true, "retries": 3}"#,
        )
        .unwrap();

        let (name, values) = load_config_file("config.local", dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(name, "config.local.json");
        assert_eq!(values.get("debug"), Some(&json!(true)));
        assert_eq!(values.get("retries"), Some(&json!(3)));
    }

    #[test]
    fn test_extension_priority() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.default.toml"), "winner = \"toml\"\n").unwrap();
        fs::write(dir.path().join("config.default.json"), r#"{"winner": "json"}"#).unwrap();

        let (name, values) = load_config_file("config.default", dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(name, "config.default.toml");
        assert_eq!(values.get("winner"), Some(&json!("toml")));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_file("config.default", dir.path())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.default.toml"), "[invalid\n").unwrap();

        let result = load_config_file("config.default", dir.path());
        assert!(matches!(result, Err(ConfigFileError::TomlParse { .. })));
    }

    #[test]
    fn test_non_table_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.default.json"), "[1, 2, 3]").unwrap();

        let result = load_config_file("config.default", dir.path());
        assert!(matches!(result, Err(ConfigFileError::NotATable { .. })));
    }

    #[test]
    fn test_default_table_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.default.toml"),
            "host = \"named\"\n\n[default]\nhost = \"unwrapped\"\nport = 8080\n",
        )
        .unwrap();

        let (_, values) = load_config_file("config.default", dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(values.get("host"), Some(&json!("unwrapped")));
        assert_eq!(values.get("port"), Some(&json!(8080)));
        assert!(!values.contains_key("default"));
    }
}
