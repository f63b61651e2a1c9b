//! Engine options.

use std::path::PathBuf;

use lamina_errors::ConfigError;
use validator::Validate;

/// Options recognized by the configuration engine.
///
/// All fields have working defaults; a plain `EngineSettings::default()`
/// loads `config.default.*` and the process environment from the current
/// working directory.
#[derive(Debug, Clone, Validate)]
pub struct EngineSettings {
    /// Directory used to resolve config files.
    pub base_path: PathBuf,

    /// Environment variable carrying the environment label.
    #[validate(length(min = 1, message = "envKey must not be empty"))]
    pub env_key: String,

    /// Load `config.default.*`, `config.<env>.*` and local override files.
    pub load_config_files: bool,

    /// Load process environment variables.
    pub load_environment: bool,

    /// Print a redacted dump of the config after each successful load.
    pub print_config: bool,

    /// Disable permissive coercion of raw values.
    pub strict: bool,

    /// Warn when a local override file is present.
    pub warn_on_local_config_file: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_key: "APP_ENV".to_string(),
            load_config_files: true,
            load_environment: true,
            print_config: false,
            strict: false,
            warn_on_local_config_file: true,
        }
    }
}

impl EngineSettings {
    /// Validates the settings, mapping violations into [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|errors| ConfigError::InvalidOptions {
            message: errors.to_string(),
        })?;

        Ok(self)
    }
}
