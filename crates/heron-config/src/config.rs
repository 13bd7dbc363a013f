//! Configuration types.
//!
//! [`HeronConfig`] is the root; each section converts into the options type
//! of the crate it configures.

use heron_bind::UnresolvedPolicy;
use heron_middleware::DispatchOptions;
use heron_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete Heron configuration.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
/// use heron_bind::UnresolvedPolicy;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.dispatch.unresolved, UnresolvedPolicy::Reject);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Dispatch configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HeronConfig {
    /// Development preset: pretty debug logs, every binding logged.
    #[must_use]
    pub fn development() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                span_events: true,
                ..LoggingConfig::default()
            },
        }
    }

    /// Production preset: JSON info logs, no per-parameter events.
    #[must_use]
    pub fn production() -> Self {
        Self {
            dispatch: DispatchConfig {
                log_bindings: false,
                ..DispatchConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log level is not a valid
    /// filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging
            .to_log_config()
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))
    }
}

/// The `[dispatch]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// What to do with parameters nothing can satisfy.
    pub unresolved: UnresolvedPolicy,

    /// Emit a debug event per bound parameter.
    pub log_bindings: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::Reject,
            log_bindings: true,
        }
    }
}

impl DispatchConfig {
    /// Converts into the dispatcher's options.
    #[must_use]
    pub fn to_options(&self) -> DispatchOptions {
        DispatchOptions {
            unresolved: self.unresolved,
            log_bindings: self.log_bindings,
        }
    }
}

impl From<DispatchConfig> for DispatchOptions {
    fn from(config: DispatchConfig) -> Self {
        config.to_options()
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info" or "heron_bind=debug,info").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to log span open/close events.
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Converts into the logging initializer's configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            span_events: self.span_events,
            ..base
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        config.to_log_config()
    }
}
