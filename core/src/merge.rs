//! # Merge Engine
//!
//! Overlays raw maps from all sources into a single map, later sources
//! winning on key collision, and computes the earliest next-reload deadline
//! across all plugins.
//!
//! Plugins are awaited sequentially in registration order, never
//! concurrently: a later plugin may depend on values produced by an earlier
//! one (a feature-flag client needing an API key resolved by a secrets
//! plugin). Within the plugin step each plugin's values overlay the
//! accumulated result of prior plugins.

use lamina_errors::ConfigError;
use tokio::time::Duration;

use crate::file_loader::RawMap;
use crate::origins::OriginLedger;
use crate::plugin::PluginSlot;

/// Applies one source's values over the accumulated raw map.
///
/// Every key the source declares participates, null values included; the
/// decision to skip empty values belongs to the individual source loaders.
pub fn overlay(target: &mut RawMap, source: RawMap) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Values and reload hint produced by one pass over the registered plugins.
pub(crate) struct PluginCycleOutcome {
    pub values: RawMap,
    pub next_reload_in: Option<Duration>,
}

/// Runs one plugin cycle.
///
/// First cycle for a slot calls `load()`; later cycles call `reload()`,
/// which self-gates on the plugin's own deadline — a `None` result means
/// "not due" and the slot's cached output is reused. A plugin error
/// propagates and aborts the whole load: remote sources often carry
/// required secrets, so a missing plugin result is load-fatal.
pub(crate) async fn run_plugin_cycle(
    slots: &mut [PluginSlot],
    ledger: &mut OriginLedger,
) -> Result<PluginCycleOutcome, ConfigError> {
    let mut values = RawMap::new();
    let mut next_reload_in: Option<Duration> = None;

    for slot in slots.iter_mut() {
        let name = slot.plugin.name().to_string();

        let fresh = if slot.cached.is_none() {
            tracing::debug!(plugin = %name, "loading plugin");
            Some(slot.plugin.load().await?)
        } else {
            tracing::debug!(plugin = %name, "polling plugin");
            slot.plugin.reload().await?
        };

        if let Some(output) = fresh {
            slot.store(output);
        }

        if let Some(cached) = &slot.cached {
            overlay(&mut values, cached.values.clone());
            ledger.merge(&cached.value_origins);
        }

        next_reload_in = coalesce_deadline(next_reload_in, slot.remaining());
    }

    Ok(PluginCycleOutcome {
        values,
        next_reload_in,
    })
}

/// Minimum of two optional deadlines; `None` never wins.
pub fn coalesce_deadline(
    current: Option<Duration>,
    candidate: Option<Duration>,
) -> Option<Duration> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}
