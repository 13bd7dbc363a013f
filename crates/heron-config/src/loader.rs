//! Layered configuration loading.
//!
//! [`ConfigLoader`] starts from defaults, replaces them with a file (TOML
//! or JSON) and then applies `PREFIX__SECTION__KEY` environment overrides.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use heron_bind::UnresolvedPolicy;
use heron_telemetry::LogFormat;

use crate::{ConfigError, HeronConfig};

/// Default prefix of environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "HERON";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked from the extension (`.toml` or `.json`).
    /// Sections missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// has an unsupported extension or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        self.config = parse(&content, extension.as_deref().unwrap_or_default())
            .map_err(|e| match e {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::with_file`] when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_bind::UnresolvedPolicy;
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[dispatch]\nunresolved = \"omit\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.dispatch.unresolved, UnresolvedPolicy::Omit);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `HERON__DISPATCH__UNRESOLVED=omit` or `HERON__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or the final
    /// configuration is invalid.
    pub fn load(mut self) -> Result<HeronConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: HashMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in &vars {
                apply_env_var(&mut self.config, key, value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse(content: &str, format: &str) -> Result<HeronConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn apply_env_var(
    config: &mut HeronConfig,
    key: &str,
    value: &str,
    prefix: &str,
) -> Result<(), ConfigError> {
    // Other variables sharing the prefix (e.g. HERON_HOME) are not ours.
    let Some(path) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
        return Ok(());
    };
    let parts: Vec<&str> = path.split("__").collect();

    match parts.as_slice() {
        ["DISPATCH", "UNRESOLVED"] => {
            config.dispatch.unresolved = match value.to_lowercase().as_str() {
                "reject" => UnresolvedPolicy::Reject,
                "omit" => UnresolvedPolicy::Omit,
                _ => return Err(ConfigError::env_parse_error(key, "expected 'reject' or 'omit'")),
            };
        }
        ["DISPATCH", "LOG_BINDINGS"] => {
            config.dispatch.log_bindings = parse_bool(value)
                .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
        }
        ["LOGGING", "ENABLED"] => {
            config.logging.enabled = parse_bool(value)
                .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
        }
        ["LOGGING", "LEVEL"] => {
            config.logging.level = value.to_string();
        }
        ["LOGGING", "FORMAT"] => {
            config.logging.format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
            };
        }
        ["LOGGING", "SPAN_EVENTS"] => {
            config.logging.span_events = parse_bool(value)
                .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
        }
        _ => {}
    }

    Ok(())
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
