//! # Configuration Engine
//!
//! Orchestrates the load/reload lifecycle: gathers raw values from config
//! files, plugins and the process environment in precedence order, runs the
//! schema validation pass, stores the resulting snapshot and arms the
//! auto-reload timer from the soonest plugin deadline.
//!
//! The engine is a cheap clone-able handle; all load/reload work is a
//! sequence of awaited steps, never two pipeline stages concurrently against
//! the same instance. Concurrent `reload()` calls are permitted and race
//! benignly: each installs the snapshot it produced, last write wins.

use std::sync::Arc;

use lamina_errors::ConfigError;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::environment::{ENVIRONMENT_ORIGIN, environment_name, load_environment};
use crate::file_loader::{RawMap, load_config_file};
use crate::merge::{overlay, run_plugin_cycle};
use crate::options::EngineSettings;
use crate::origins::OriginLedger;
use crate::parser::parse_config;
use crate::plugin::{ConfigPlugin, PluginSlot};
use crate::printer::print_config;
use crate::redactor::redact_config;
use crate::schema::Schema;
use crate::snapshot::ConfigSnapshot;

/// Origin identifier recorded for declared defaults.
pub const DEFAULT_ORIGIN: &str = "default";

/// Lifecycle notification emitted to subscribers.
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// First successful load completed.
    Loaded(ConfigSnapshot),

    /// A subsequent reload completed and replaced the snapshot.
    Reloaded(ConfigSnapshot),
}

struct EngineState {
    snapshot: Option<ConfigSnapshot>,
    origins: OriginLedger,
}

struct PluginSet {
    initialized: bool,
    slots: Vec<PluginSlot>,
}

struct EngineInner {
    schema: Schema,
    settings: EngineSettings,
    state: RwLock<EngineState>,
    plugins: tokio::sync::Mutex<PluginSet>,
    reload_timer: Mutex<Option<JoinHandle<()>>>,
    subscribers: Mutex<Vec<mpsc::Sender<ConfigEvent>>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(handle) = self.reload_timer.lock().take() {
            handle.abort();
        }
    }
}

/// The layered configuration engine.
///
/// ```rust,no_run
/// use lamina::{ConfigEngine, EngineSettings, FieldValidator, Schema};
///
/// # async fn demo() -> Result<(), lamina_errors::ConfigError> {
/// let schema = Schema::builder()
///     .field("port", FieldValidator::integer().default_value(8080))
///     .field("log_level", FieldValidator::string().default_value("info"))
///     .build();
///
/// let engine = ConfigEngine::new(schema, EngineSettings::default(), Vec::new())?;
/// engine.load().await?;
///
/// let config = engine.get_config()?;
/// assert_eq!(config.get_i64("port"), Some(8080));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigEngine {
    inner: Arc<EngineInner>,
}

impl ConfigEngine {
    /// Creates an engine over a declared schema, validated settings and an
    /// ordered list of plugins.
    ///
    /// Plugin registration order is overlay order: later plugins override
    /// earlier ones, and later plugins may depend on values the earlier
    /// ones resolved.
    pub fn new(
        schema: Schema,
        settings: EngineSettings,
        plugins: Vec<Box<dyn ConfigPlugin>>,
    ) -> Result<Self, ConfigError> {
        let settings = settings.validated()?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                schema,
                settings,
                state: RwLock::new(EngineState {
                    snapshot: None,
                    origins: OriginLedger::new(),
                }),
                plugins: tokio::sync::Mutex::new(PluginSet {
                    initialized: false,
                    slots: plugins.into_iter().map(PluginSlot::new).collect(),
                }),
                reload_timer: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Loads the config from config files, environment variables and any
    /// registered plugins.
    ///
    /// Idempotent: calling it again while already loaded resolves
    /// immediately without re-running the pipeline.
    pub async fn load(&self) -> Result<(), ConfigError> {
        if self.is_loaded() {
            tracing::debug!("config already loaded");
            return Ok(());
        }

        let snapshot = self.load_config().await?;
        self.emit(ConfigEvent::Loaded(snapshot));

        Ok(())
    }

    /// Force-reloads the config, unconditionally re-running the pipeline.
    ///
    /// The stored snapshot is replaced only on validation success; on
    /// failure the previous snapshot remains current.
    pub async fn reload(&self) -> Result<(), ConfigError> {
        tracing::debug!("reloading config");

        let snapshot = self.load_config().await?;
        self.emit(ConfigEvent::Reloaded(snapshot));

        Ok(())
    }

    /// Returns the current validated snapshot.
    pub fn get_config(&self) -> Result<ConfigSnapshot, ConfigError> {
        self.inner
            .state
            .read()
            .snapshot
            .clone()
            .ok_or(ConfigError::NotLoaded)
    }

    /// Returns the current snapshot with sensitive values redacted.
    ///
    /// Redaction runs on every call; the redacted copy is not cached.
    pub fn get_redacted_config(&self) -> Result<ConfigSnapshot, ConfigError> {
        let snapshot = self.get_config()?;

        Ok(ConfigSnapshot::new(redact_config(
            &self.inner.schema,
            snapshot.values(),
        )))
    }

    /// Per-key origin chains from the last successful load.
    pub fn value_origins(&self) -> OriginLedger {
        self.inner.state.read().origins.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.state.read().snapshot.is_some()
    }

    /// Subscribes to lifecycle notifications.
    pub fn subscribe(&self) -> mpsc::Receiver<ConfigEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Cancels any armed auto-reload timer.
    ///
    /// Dropping the last engine handle does the same; this exists for
    /// explicit shutdown paths.
    pub fn stop_auto_reload(&self) {
        if let Some(handle) = self.inner.reload_timer.lock().take() {
            handle.abort();
        }
    }

    async fn load_config(&self) -> Result<ConfigSnapshot, ConfigError> {
        let settings = &self.inner.settings;
        let environment = environment_name(&settings.env_key);
        tracing::debug!(environment = %environment, "loading config");

        let mut raw = RawMap::new();
        let mut ledger = OriginLedger::new();

        // The plugin set stays locked for the whole gather phase so plugin
        // state never interleaves between concurrent cycles.
        let mut plugins = self.inner.plugins.lock().await;

        if !plugins.initialized {
            let current = self.current_values();
            for slot in &mut plugins.slots {
                if slot.plugin.is_initialized() {
                    continue;
                }
                tracing::debug!(plugin = %slot.plugin.name(), "initializing plugin");
                slot.plugin.initialize(settings, &current).await?;
            }
            plugins.initialized = true;
        }

        self.apply_config_file(&mut raw, &mut ledger, "config.default", false);
        self.apply_config_file(&mut raw, &mut ledger, &format!("config.{environment}"), false);

        let plugin_outcome = run_plugin_cycle(&mut plugins.slots, &mut ledger).await?;
        overlay(&mut raw, plugin_outcome.values);

        self.apply_config_file(
            &mut raw,
            &mut ledger,
            &format!("config.{environment}.local"),
            true,
        );
        self.apply_config_file(&mut raw, &mut ledger, "config.local", true);

        if settings.load_environment {
            let values = load_environment(&self.inner.schema);
            ledger.record(values.keys(), ENVIRONMENT_ORIGIN);
            overlay(&mut raw, values);
        }

        drop(plugins);

        let outcome = parse_config(&self.inner.schema, &raw, settings.strict).map_err(|error| {
            if let ConfigError::Validation { report, .. } = &error {
                tracing::error!("Errors found while validating config");
                eprintln!("{report}");
            }
            error
        })?;

        ledger.record_defaults(&outcome.defaulted_keys, DEFAULT_ORIGIN);

        let snapshot = ConfigSnapshot::new(outcome.values);
        ledger.retain_keys(|key| snapshot.get(key).is_some());

        if settings.print_config {
            let redacted = redact_config(&self.inner.schema, snapshot.values());
            print_config(&redacted, &ledger);
        }

        {
            let mut state = self.inner.state.write();
            state.snapshot = Some(snapshot.clone());
            state.origins = ledger;
        }

        self.arm_reload_timer(plugin_outcome.next_reload_in);

        Ok(snapshot)
    }

    fn apply_config_file(
        &self,
        raw: &mut RawMap,
        ledger: &mut OriginLedger,
        stem: &str,
        local: bool,
    ) {
        if !self.inner.settings.load_config_files {
            tracing::debug!(stem = %stem, "config file loading disabled");
            return;
        }

        match load_config_file(stem, &self.inner.settings.base_path) {
            Ok(Some((name, values))) => {
                if local && self.inner.settings.warn_on_local_config_file {
                    tracing::warn!("Loaded local config file: {name}");
                }
                ledger.record(values.keys(), &name);
                overlay(raw, values);
            }
            Ok(None) => {}
            Err(error) => {
                // A broken file source contributes an empty map instead of
                // aborting the load.
                let error = ConfigError::SourceRead {
                    source_name: stem.to_string(),
                    reason: error.to_string(),
                };
                tracing::warn!("{error}");
            }
        }
    }

    fn current_values(&self) -> RawMap {
        self.inner
            .state
            .read()
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.values().clone())
            .unwrap_or_default()
    }

    fn emit(&self, event: ConfigEvent) {
        self.inner.subscribers.lock().retain(|tx| {
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                // A slow subscriber misses this event but stays subscribed.
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Replaces the one-shot reload timer with a new deadline, if any.
    ///
    /// The previous timer is canceled first so auto-reloads never stack. The
    /// spawned task only holds a weak handle: dropping the last engine
    /// handle stops auto-reloading.
    fn arm_reload_timer(&self, delay: Option<Duration>) {
        let mut guard = self.inner.reload_timer.lock();

        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let Some(delay) = delay else {
            return;
        };

        tracing::debug!(delay_ms = delay.as_millis() as u64, "arming reload timer");

        let weak = Arc::downgrade(&self.inner);
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let engine = ConfigEngine { inner };

            if let Err(error) = engine.reload().await {
                tracing::error!("Scheduled config reload failed: {error}");
            }
        }));
    }
}
