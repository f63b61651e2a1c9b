//! Human-readable config dump.
//!
//! Prints each key with its (already redacted) value and origin chain,
//! newest origin first with overridden origins dimmed. Presentation only;
//! enabled with the `print_config` engine option.

use console::style;
use serde_json::Value;

use crate::file_loader::RawMap;
use crate::origins::OriginLedger;

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "'' <empty string>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_chain(chain: Option<&[String]>) -> String {
    let Some(chain) = chain else {
        return "unknown".to_string();
    };

    chain
        .iter()
        .rev()
        .enumerate()
        .map(|(index, origin)| {
            if index == 0 {
                origin.to_string()
            } else {
                style(origin).dim().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" \u{2190} ")
}

/// One rendered line per key, sorted by key.
pub fn render_lines(values: &RawMap, origins: &OriginLedger) -> Vec<String> {
    values
        .iter()
        .map(|(key, value)| {
            format!(
                "{}: {} {}",
                style(key).green(),
                style(render_value(value)).magenta(),
                style(format!("[{}]", render_chain(origins.get(key)))).dim()
            )
        })
        .collect()
}

/// Prints the rendered config to stdout.
pub fn print_config(values: &RawMap, origins: &OriginLedger) {
    for line in render_lines(values, origins) {
        println!("{line}");
    }
}
