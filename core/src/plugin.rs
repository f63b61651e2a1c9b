//! # Plugin Protocol
//!
//! Contract for pluggable remote configuration sources (parameter stores,
//! secrets managers, feature-flag services, file readers).
//!
//! Plugins are polled on their own schedule: each `load()` may report a
//! `next_reload_in` hint, and the engine coalesces the next global reload to
//! the soonest plugin deadline. A plugin with no hint is loaded exactly once
//! per cycle but never triggers a scheduled reload on its own.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lamina_errors::ConfigError;
use tokio::time::{Duration, Instant};

use crate::file_loader::RawMap;
use crate::interval::ReloadInterval;
use crate::options::EngineSettings;

/// Result of one plugin load: the full current value set for that source
/// (not a delta), the plugin's own per-key origin bookkeeping, and an
/// optional reload hint.
#[derive(Debug, Clone, Default)]
pub struct PluginOutput {
    pub values: RawMap,
    pub value_origins: BTreeMap<String, Vec<String>>,
    pub next_reload_in: Option<Duration>,
}

impl PluginOutput {
    /// Convenience constructor recording every value under a single origin.
    pub fn with_origin(values: RawMap, origin: &str) -> Self {
        let value_origins = values
            .keys()
            .map(|key| (key.clone(), vec![origin.to_string()]))
            .collect();

        Self {
            values,
            value_origins,
            next_reload_in: None,
        }
    }

    pub fn next_reload_in(mut self, interval: Option<Duration>) -> Self {
        self.next_reload_in = interval;
        self
    }
}

/// A pluggable configuration source.
///
/// Lifecycle: constructed by the caller, `initialize` called at most once
/// per engine lifetime (lazily, on the first `load()` of the engine),
/// `load` called on the first cycle, `reload` on subsequent cycles.
#[async_trait]
pub trait ConfigPlugin: Send + Sync {
    /// Stable identifier used in origin chains and error messages.
    fn name(&self) -> &str;

    fn is_initialized(&self) -> bool;

    /// Called at most once per engine lifetime, before the first load.
    ///
    /// `current_values` holds the values accumulated so far (for example an
    /// API key resolved by an earlier source). Failing here aborts the first
    /// `load()`.
    async fn initialize(
        &mut self,
        settings: &EngineSettings,
        current_values: &RawMap,
    ) -> Result<(), ConfigError>;

    /// Produces the full current value set for this source.
    ///
    /// Must be safe to call repeatedly.
    async fn load(&mut self) -> Result<PluginOutput, ConfigError>;

    /// Self-gating reload: returns `None` while the plugin's own deadline
    /// has not elapsed, otherwise behaves like `load()` and re-arms the
    /// deadline.
    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError>;

    /// The configured poll interval, if any.
    fn next_reload_in(&self) -> Option<Duration>;
}

/// Interval and deadline bookkeeping shared by plugin implementations.
///
/// Embed one in a plugin, call [`PluginSchedule::mark_loaded`] from `load()`
/// and gate `reload()` on [`PluginSchedule::due`]:
///
/// ```rust,no_run
/// use lamina::plugin::PluginSchedule;
///
/// # fn demo() -> Result<(), lamina_errors::ConfigError> {
/// let mut schedule = PluginSchedule::new(Some("5m".into()))?;
/// if schedule.due() {
///     // ... fetch values ...
///     schedule.mark_loaded();
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PluginSchedule {
    interval: Option<Duration>,
    next_reload_at: Option<Instant>,
}

impl PluginSchedule {
    /// Resolves the configured interval up front so a malformed duration
    /// string fails at construction rather than mid-reload.
    pub fn new(interval: Option<ReloadInterval>) -> Result<Self, ConfigError> {
        let interval = interval.map(|i| i.as_duration()).transpose()?;

        Ok(Self {
            interval,
            next_reload_at: interval.map(|i| Instant::now() + i),
        })
    }

    /// The configured poll interval.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Whether the plugin's own deadline has elapsed.
    ///
    /// Always false for plugins without an interval; they load once per
    /// engine cycle and never self-trigger.
    pub fn due(&self) -> bool {
        match self.next_reload_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    /// Re-arms the deadline after a successful load.
    pub fn mark_loaded(&mut self) {
        self.next_reload_at = self.interval.map(|i| Instant::now() + i);
    }
}

/// Engine-side descriptor for one registered plugin.
///
/// Owned by the engine; tracks the cached output of the last poll and the
/// absolute deadline used for global reload coalescing.
pub(crate) struct PluginSlot {
    pub plugin: Box<dyn ConfigPlugin>,
    pub cached: Option<PluginOutput>,
    pub next_reload_at: Option<Instant>,
}

impl PluginSlot {
    pub fn new(plugin: Box<dyn ConfigPlugin>) -> Self {
        Self {
            plugin,
            cached: None,
            next_reload_at: None,
        }
    }

    /// Stores a fresh output and re-arms the slot deadline from its hint.
    pub fn store(&mut self, output: PluginOutput) {
        self.next_reload_at = output.next_reload_in.map(|d| Instant::now() + d);
        self.cached = Some(output);
    }

    /// Time remaining until this plugin wants to be polled again.
    pub fn remaining(&self) -> Option<Duration> {
        self.next_reload_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}
