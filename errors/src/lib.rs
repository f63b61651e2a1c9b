//! # Lamina Errors
//!
//! Error taxonomy for the lamina configuration loader.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields throughout so call sites read as documentation
//! - `FieldFailure` carries the per-key context used by the aggregated
//!   validation report

use serde::Serialize;
use thiserror::Error;

/// Detail record for one schema key that failed validation.
///
/// Collected (not short-circuited) across the whole validation pass and
/// rendered into a single multi-key report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldFailure {
    /// Schema key that failed
    pub key: String,

    /// Raw value the key received, if any source supplied one
    pub received: Option<serde_json::Value>,

    /// One or more validation messages for the key
    pub messages: Vec<String>,

    /// Whether the declared default was the value under validation
    pub default_used: bool,

    /// The declared default, if the field has one
    pub default_value: Option<serde_json::Value>,

    /// The field's declared description, if any
    pub description: Option<String>,
}

/// Errors produced by the configuration engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config values have not been loaded. You must call `load()` first.")]
    NotLoaded,

    #[error("Invalid engine options: {message}")]
    InvalidOptions { message: String },

    #[error("Failed to read config source {source_name}: {reason}")]
    SourceRead { source_name: String, reason: String },

    #[error("Plugin {plugin} failed to initialize: {reason}")]
    PluginInit { plugin: String, reason: String },

    #[error("Plugin {plugin} failed to load: {reason}")]
    PluginLoad { plugin: String, reason: String },

    #[error("Invalid reload interval: {input}")]
    InvalidInterval { input: String },

    #[error("Errors found while validating config\n\n{report}")]
    Validation {
        failures: Vec<FieldFailure>,
        report: String,
    },
}

impl ConfigError {
    /// Validation failures carried by this error, if it is a validation error.
    pub fn field_failures(&self) -> &[FieldFailure] {
        match self {
            ConfigError::Validation { failures, .. } => failures,
            _ => &[],
        }
    }
}
