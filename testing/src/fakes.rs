//! Fake plugins.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lamina::file_loader::RawMap;
use lamina::plugin::{ConfigPlugin, PluginOutput, PluginSchedule};
use lamina::{EngineSettings, ReloadInterval};
use lamina_errors::ConfigError;
use tokio::time::Duration;

/// Shared call counters exposed by the fakes.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub initializes: AtomicUsize,
    pub loads: AtomicUsize,
    pub reload_polls: AtomicUsize,
}

/// A plugin that serves a fixed value set and counts its calls.
pub struct FakePlugin {
    name: String,
    values: RawMap,
    schedule: PluginSchedule,
    counts: Arc<CallCounts>,
    initialized: bool,
    seen_values_at_init: Option<RawMap>,
}

impl FakePlugin {
    pub fn new(name: &str, values: RawMap) -> Self {
        Self::with_interval(name, values, None)
    }

    pub fn with_interval(
        name: &str,
        values: RawMap,
        interval: Option<ReloadInterval>,
    ) -> Self {
        Self {
            name: name.to_string(),
            values,
            schedule: PluginSchedule::new(interval).expect("valid test interval"),
            counts: Arc::new(CallCounts::default()),
            initialized: false,
            seen_values_at_init: None,
        }
    }

    pub fn counts(&self) -> Arc<CallCounts> {
        self.counts.clone()
    }

    /// The accumulated values passed to `initialize`, once it has run.
    pub fn seen_values_at_init(&self) -> Option<&RawMap> {
        self.seen_values_at_init.as_ref()
    }

    /// Replaces the served values; visible on the next poll.
    pub fn set_values(&mut self, values: RawMap) {
        self.values = values;
    }
}

#[async_trait]
impl ConfigPlugin for FakePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn initialize(
        &mut self,
        _settings: &EngineSettings,
        current_values: &RawMap,
    ) -> Result<(), ConfigError> {
        self.counts.initializes.fetch_add(1, Ordering::SeqCst);
        self.seen_values_at_init = Some(current_values.clone());
        self.initialized = true;

        Ok(())
    }

    async fn load(&mut self) -> Result<PluginOutput, ConfigError> {
        self.counts.loads.fetch_add(1, Ordering::SeqCst);
        self.schedule.mark_loaded();

        Ok(PluginOutput::with_origin(self.values.clone(), &self.name)
            .next_reload_in(self.schedule.interval()))
    }

    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError> {
        self.counts.reload_polls.fetch_add(1, Ordering::SeqCst);

        if !self.schedule.due() {
            return Ok(None);
        }

        Ok(Some(self.load().await?))
    }

    fn next_reload_in(&self) -> Option<Duration> {
        self.schedule.interval()
    }
}

/// Where a [`FailingPlugin`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Initialize,
    Load,
}

/// A plugin that fails at a chosen lifecycle point.
pub struct FailingPlugin {
    name: String,
    failure_point: FailurePoint,
    initialized: bool,
}

impl FailingPlugin {
    pub fn new(name: &str, failure_point: FailurePoint) -> Self {
        Self {
            name: name.to_string(),
            failure_point,
            initialized: false,
        }
    }
}

#[async_trait]
impl ConfigPlugin for FailingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn initialize(
        &mut self,
        _settings: &EngineSettings,
        _current_values: &RawMap,
    ) -> Result<(), ConfigError> {
        if self.failure_point == FailurePoint::Initialize {
            return Err(ConfigError::PluginInit {
                plugin: self.name.clone(),
                reason: "deliberate test failure".to_string(),
            });
        }

        self.initialized = true;
        Ok(())
    }

    async fn load(&mut self) -> Result<PluginOutput, ConfigError> {
        Err(ConfigError::PluginLoad {
            plugin: self.name.clone(),
            reason: "deliberate test failure".to_string(),
        })
    }

    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError> {
        Ok(Some(self.load().await?))
    }

    fn next_reload_in(&self) -> Option<Duration> {
        None
    }
}

/// A plugin that serves a queue of payloads, one per poll, repeating the
/// last payload once the queue drains. Polls are always due.
pub struct SequencePlugin {
    name: String,
    queue: VecDeque<RawMap>,
    current: RawMap,
    interval: Option<Duration>,
    initialized: bool,
}

impl SequencePlugin {
    pub fn new(name: &str, payloads: Vec<RawMap>, interval: Option<Duration>) -> Self {
        Self {
            name: name.to_string(),
            queue: payloads.into_iter().collect(),
            current: RawMap::new(),
            interval,
            initialized: false,
        }
    }
}

#[async_trait]
impl ConfigPlugin for SequencePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn initialize(
        &mut self,
        _settings: &EngineSettings,
        _current_values: &RawMap,
    ) -> Result<(), ConfigError> {
        self.initialized = true;
        Ok(())
    }

    async fn load(&mut self) -> Result<PluginOutput, ConfigError> {
        if let Some(next) = self.queue.pop_front() {
            self.current = next;
        }

        Ok(PluginOutput::with_origin(self.current.clone(), &self.name)
            .next_reload_in(self.interval))
    }

    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError> {
        Ok(Some(self.load().await?))
    }

    fn next_reload_in(&self) -> Option<Duration> {
        self.interval
    }
}
