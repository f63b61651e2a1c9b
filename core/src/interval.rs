//! Reload interval parsing.
//!
//! Plugins declare how often they want to be polled either as a plain
//! millisecond count or as a short human-readable duration string such as
//! `"30s"` or `"5m"`.

use std::time::Duration;

use lamina_errors::ConfigError;

/// A plugin reload interval, as configured by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadInterval {
    /// Plain millisecond count.
    Millis(u64),

    /// Duration string: an integer followed by `ms`, `s`, `m`, `h` or `d`.
    Text(String),
}

impl ReloadInterval {
    /// Resolves the interval to a [`Duration`].
    pub fn as_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            ReloadInterval::Millis(ms) => Ok(Duration::from_millis(*ms)),
            ReloadInterval::Text(text) => parse_duration_text(text),
        }
    }
}

impl From<u64> for ReloadInterval {
    fn from(ms: u64) -> Self {
        ReloadInterval::Millis(ms)
    }
}

impl From<&str> for ReloadInterval {
    fn from(text: &str) -> Self {
        ReloadInterval::Text(text.to_string())
    }
}

impl From<String> for ReloadInterval {
    fn from(text: String) -> Self {
        ReloadInterval::Text(text)
    }
}

fn parse_duration_text(text: &str) -> Result<Duration, ConfigError> {
    let trimmed = text.trim();
    let invalid = || ConfigError::InvalidInterval {
        input: text.to_string(),
    };

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, unit) = trimmed.split_at(split);
    let count: u64 = digits.parse().map_err(|_| invalid())?;

    let multiplier_ms = match unit.trim() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60 * 1_000,
        "h" => 60 * 60 * 1_000,
        "d" => 24 * 60 * 60 * 1_000,
        _ => return Err(invalid()),
    };

    Ok(Duration::from_millis(count * multiplier_ms))
}
