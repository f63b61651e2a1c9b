//! # File Plugin
//!
//! Pluggable source that reads extra config files matched by glob patterns.
//!
//! Files are merged in sorted path order, later files winning on key
//! collision, and each key's origin records the file that supplied it. A
//! file that fails to parse is logged and skipped; the remaining files
//! still load. Supports the same formats as the engine's own config files
//! (TOML, YAML, JSON).

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use lamina::file_loader::{RawMap, load_file};
use lamina::plugin::{ConfigPlugin, PluginOutput, PluginSchedule};
use lamina::{EngineSettings, ReloadInterval};
use lamina_errors::ConfigError;
use tokio::time::Duration;

/// Options for [`FilePlugin`].
#[derive(Debug, Clone, Default)]
pub struct FilePluginOptions {
    /// Glob patterns, resolved relative to the engine's base path unless
    /// absolute.
    pub patterns: Vec<String>,

    /// How often the matched files are re-read, if at all.
    pub reload_interval: Option<ReloadInterval>,
}

/// Reads config values from files matched by glob patterns.
pub struct FilePlugin {
    options: FilePluginOptions,
    schedule: PluginSchedule,
    base_path: Option<PathBuf>,
    initialized: bool,
}

impl FilePlugin {
    /// A malformed reload interval fails here, at construction.
    pub fn new(options: FilePluginOptions) -> Result<Self, ConfigError> {
        let schedule = PluginSchedule::new(options.reload_interval.clone())?;

        Ok(Self {
            options,
            schedule,
            base_path: None,
            initialized: false,
        })
    }

    fn matched_paths(&self, base_path: &PathBuf) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for pattern in &self.options.patterns {
            let full_pattern = if std::path::Path::new(pattern).is_absolute() {
                pattern.clone()
            } else {
                base_path.join(pattern).to_string_lossy().into_owned()
            };

            match glob::glob(&full_pattern) {
                Ok(matches) => {
                    for entry in matches {
                        match entry {
                            Ok(path) if path.is_file() => paths.push(path),
                            Ok(_) => {}
                            Err(error) => {
                                tracing::warn!("Unreadable path for pattern {pattern}: {error}");
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!("Invalid glob pattern {pattern}: {error}");
                }
            }
        }

        paths.sort();
        paths.dedup();
        paths
    }

    fn read_values(&self, base_path: &PathBuf) -> (RawMap, BTreeMap<String, Vec<String>>) {
        let mut values = RawMap::new();
        let mut value_origins: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for path in self.matched_paths(base_path) {
            let origin = path.display().to_string();

            match load_file(&path) {
                Ok(file_values) => {
                    for (key, value) in file_values {
                        let chain = value_origins.entry(key.clone()).or_default();
                        if !chain.contains(&origin) {
                            chain.push(origin.clone());
                        }
                        values.insert(key, value);
                    }
                }
                Err(error) => {
                    tracing::warn!("Skipping config file {origin}: {error}");
                }
            }
        }

        (values, value_origins)
    }
}

#[async_trait]
impl ConfigPlugin for FilePlugin {
    fn name(&self) -> &str {
        "file"
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn initialize(
        &mut self,
        settings: &EngineSettings,
        _current_values: &RawMap,
    ) -> Result<(), ConfigError> {
        self.base_path = Some(settings.base_path.clone());
        self.initialized = true;

        Ok(())
    }

    async fn load(&mut self) -> Result<PluginOutput, ConfigError> {
        let base_path = self
            .base_path
            .clone()
            .ok_or_else(|| ConfigError::PluginLoad {
                plugin: self.name().to_string(),
                reason: "plugin not initialized".to_string(),
            })?;

        let (values, value_origins) = self.read_values(&base_path);

        tracing::debug!(keys = values.len(), "file plugin loaded");

        self.schedule.mark_loaded();

        Ok(PluginOutput {
            values,
            value_origins,
            next_reload_in: self.schedule.interval(),
        })
    }

    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError> {
        if !self.schedule.due() {
            return Ok(None);
        }

        Ok(Some(self.load().await?))
    }

    fn next_reload_in(&self) -> Option<Duration> {
        self.schedule.interval()
    }
}
