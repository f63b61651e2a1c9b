//! Aggregated validation failure reporting.
//!
//! Renders every per-key failure into one human-readable report so an
//! operator can fix all problems in a single pass.

use console::style;
use lamina_errors::FieldFailure;
use serde_json::Value;

fn indent(line: &str, depth: usize) -> String {
    format!("{}{}", "  ".repeat(depth), line)
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(value) => value.to_string(),
    }
}

/// Renders the full multi-key report for a failed validation pass.
pub fn render_report(failures: &[FieldFailure]) -> String {
    let mut sections = Vec::with_capacity(failures.len());

    for failure in failures {
        let mut lines = vec![format!("[{}]:", style(&failure.key).green())];

        for message in &failure.messages {
            lines.push(indent(message, 1));
        }

        lines.push(indent(
            &format!(
                "(received {})",
                style(render_value(failure.received.as_ref())).magenta()
            ),
            1,
        ));

        if failure.default_used {
            lines.push(indent(
                &format!(
                    "(used default of {})",
                    style(render_value(failure.default_value.as_ref())).magenta()
                ),
                2,
            ));
        }

        if let Some(description) = &failure.description {
            lines.push(String::new());
            lines.push(format!(
                "Description of [{}]: {}",
                style(&failure.key).yellow(),
                description
            ));
        }

        sections.push(
            lines
                .iter()
                .map(|line| indent(line, 1))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    format!("{}\n", sections.join("\n\n"))
}
