//! # Lamina
//!
//! Layered configuration loading for services and scripts.
//!
//! This crate provides:
//! - Ordered source overlay: default file, environment-named file, plugins,
//!   local override files, process environment variables
//! - Schema-driven validation, coercion and defaulting with aggregated
//!   per-key error reporting
//! - Per-key origin tracking (which sources contributed or overrode a value)
//! - Sensitive-value redaction for display output
//! - Plugin-interval-driven auto-reload, coalesced to the soonest deadline
//!
//! # Best Practices
//!
//! - Declare the schema once at startup and share one [`ConfigEngine`]
//!   handle; clones are cheap
//! - Treat snapshots as immutable: a reload installs a new snapshot instead
//!   of mutating the current one
//! - Keep secrets in plugins or the environment and mark their schema
//!   fields sensitive

pub mod engine;
pub mod environment;
pub mod file_loader;
pub mod interval;
pub mod merge;
pub mod options;
pub mod origins;
pub mod parser;
pub mod plugin;
pub mod printer;
pub mod redactor;
pub mod reporter;
pub mod schema;
pub mod snapshot;

pub use engine::{ConfigEngine, ConfigEvent, DEFAULT_ORIGIN};
pub use environment::{DEFAULT_ENVIRONMENT, ENVIRONMENT_ORIGIN};
pub use file_loader::{ConfigFileError, RawMap, SUPPORTED_EXTENSIONS};
pub use interval::ReloadInterval;
pub use lamina_errors::{ConfigError, FieldFailure};
pub use options::EngineSettings;
pub use origins::OriginLedger;
pub use plugin::{ConfigPlugin, PluginOutput, PluginSchedule};
pub use redactor::REDACTED_PLACEHOLDER;
pub use schema::{FieldType, FieldValidator, Schema, SchemaField};
pub use snapshot::ConfigSnapshot;
