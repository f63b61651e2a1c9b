//! Reload behavior: timer coalescing, snapshot replacement, failure
//! handling across cycles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lamina::file_loader::RawMap;
use lamina::plugin::{ConfigPlugin, PluginOutput};
use lamina::{ConfigEngine, ConfigEvent, EngineSettings, FieldValidator, Schema};
use lamina_errors::ConfigError;
use lamina_testing::{FakePlugin, SequencePlugin};
use serde_json::json;
use tokio::time::Duration;

fn settings(dir: &std::path::Path) -> EngineSettings {
    EngineSettings {
        base_path: dir.to_path_buf(),
        env_key: "LAMINA_RELOAD_TEST_ENV".to_string(),
        load_environment: false,
        ..Default::default()
    }
}

fn schema() -> Schema {
    Schema::builder()
        .field("value", FieldValidator::integer().default_value(0))
        .build()
}

/// Succeeds for a fixed number of loads, then fails.
struct FlakyPlugin {
    loads: Arc<AtomicUsize>,
    succeed_for: usize,
    initialized: bool,
}

#[async_trait]
impl ConfigPlugin for FlakyPlugin {
    fn name(&self) -> &str {
        "flaky"
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
        let count = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        if count > self.succeed_for {
            return Err(ConfigError::PluginLoad {
                plugin: "flaky".to_string(),
                reason: "remote went away".to_string(),
            });
        }

        Ok(PluginOutput::with_origin(
            RawMap::from([("value".to_string(), json!(count))]),
            "flaky",
        ))
    }

    async fn reload(&mut self) -> Result<Option<PluginOutput>, ConfigError> {
        Ok(Some(self.load().await?))
    }

    fn next_reload_in(&self) -> Option<Duration> {
        None
    }
}

#[tokio::test]
async fn timer_coalesces_to_soonest_plugin_deadline() {
    let dir = tempfile::tempdir().unwrap();

    let fast = FakePlugin::with_interval(
        "fast",
        RawMap::from([("value".to_string(), json!(1))]),
        Some(50u64.into()),
    );
    let slow = FakePlugin::with_interval("slow", RawMap::new(), Some("1h".into()));
    let fast_counts = fast.counts();
    let slow_counts = slow.counts();

    let engine = ConfigEngine::new(
        schema(),
        settings(dir.path()),
        vec![Box::new(fast), Box::new(slow)],
    )
    .unwrap();
    let mut events = engine.subscribe();

    engine.load().await.unwrap();
    assert!(matches!(events.recv().await, Some(ConfigEvent::Loaded(_))));

    // The 50ms plugin drives the next reload; the 1h plugin only gets a
    // poll, not a fresh load.
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for auto-reload")
        .expect("event channel closed");
    assert!(matches!(event, ConfigEvent::Reloaded(_)));

    engine.stop_auto_reload();

    assert!(fast_counts.loads.load(Ordering::SeqCst) >= 2);
    assert_eq!(slow_counts.loads.load(Ordering::SeqCst), 1);
    assert!(slow_counts.reload_polls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn no_hint_means_no_auto_reload() {
    let dir = tempfile::tempdir().unwrap();

    let plugin = FakePlugin::new("static", RawMap::from([("value".to_string(), json!(7))]));
    let counts = plugin.counts();

    let engine =
        ConfigEngine::new(schema(), settings(dir.path()), vec![Box::new(plugin)]).unwrap();
    engine.load().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(counts.loads.load(Ordering::SeqCst), 1);
    assert_eq!(engine.get_config().unwrap().get_i64("value"), Some(7));
}

#[tokio::test]
async fn reload_replaces_snapshot_with_new_plugin_values() {
    let dir = tempfile::tempdir().unwrap();

    let plugin = SequencePlugin::new(
        "sequence",
        vec![
            RawMap::from([("value".to_string(), json!(1))]),
            RawMap::from([("value".to_string(), json!(2))]),
        ],
        None,
    );

    let engine =
        ConfigEngine::new(schema(), settings(dir.path()), vec![Box::new(plugin)]).unwrap();

    engine.load().await.unwrap();
    let first = engine.get_config().unwrap();
    assert_eq!(first.get_i64("value"), Some(1));

    engine.reload().await.unwrap();
    let second = engine.get_config().unwrap();
    assert_eq!(second.get_i64("value"), Some(2));

    // The first snapshot is untouched by the reload.
    assert_eq!(first.get_i64("value"), Some(1));
}

#[tokio::test]
async fn failed_reload_keeps_last_good_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let loads = Arc::new(AtomicUsize::new(0));
    let plugin = FlakyPlugin {
        loads: loads.clone(),
        succeed_for: 1,
        initialized: false,
    };

    let engine =
        ConfigEngine::new(schema(), settings(dir.path()), vec![Box::new(plugin)]).unwrap();

    engine.load().await.unwrap();
    assert_eq!(engine.get_config().unwrap().get_i64("value"), Some(1));

    let error = engine.reload().await.unwrap_err();
    assert!(matches!(error, ConfigError::PluginLoad { .. }));

    // Still loaded, still serving the last good snapshot.
    assert_eq!(engine.get_config().unwrap().get_i64("value"), Some(1));
}

#[tokio::test]
async fn load_after_load_does_not_replay_events() {
    let dir = tempfile::tempdir().unwrap();

    let engine = ConfigEngine::new(schema(), settings(dir.path()), Vec::new()).unwrap();
    let mut events = engine.subscribe();

    engine.load().await.unwrap();
    engine.load().await.unwrap();
    engine.reload().await.unwrap();

    assert!(matches!(events.recv().await, Some(ConfigEvent::Loaded(_))));
    // The second load was a no-op; the next event is the reload.
    assert!(matches!(events.recv().await, Some(ConfigEvent::Reloaded(_))));
}

#[tokio::test]
async fn dropping_the_engine_stops_auto_reload() {
    let dir = tempfile::tempdir().unwrap();

    let plugin = FakePlugin::with_interval(
        "fast",
        RawMap::from([("value".to_string(), json!(1))]),
        Some(20u64.into()),
    );
    let counts = plugin.counts();

    let engine =
        ConfigEngine::new(schema(), settings(dir.path()), vec![Box::new(plugin)]).unwrap();
    engine.load().await.unwrap();
    drop(engine);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(counts.loads.load(Ordering::SeqCst), 1);
}
