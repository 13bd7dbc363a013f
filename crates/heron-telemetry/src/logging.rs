//! Structured logging for Heron.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! JSON (production) or pretty (development) output. The dispatch span
//! (`request_id`, `route`, `action`) is carried into every event logged
//! while an action is bound and invoked.
//!
//! # Example
//!
//! ```rust,no_run
//! use heron_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(route = "/posts/{post}", "routes loaded");
//! # Ok::<(), heron_telemetry::TelemetryError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "heron_bind=debug,info").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    ///
    /// Binding decisions are logged at debug level, so this shows one event
    /// per bound parameter.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }

    /// Checks that the level is a valid filter directive.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidConfig` if the filter cannot be parsed.
    pub fn validate(&self) -> TelemetryResult<()> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log level '{}': {e}", self.level)))
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for a bad level and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_target(config.include_target)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_target(config.include_target)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log level '{filter}': {e}")))
}

/// Field names used by the dispatch logs.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Matched route pattern.
    pub const ROUTE: &str = "route";

    /// Action label (`Handler@method` or `closure`).
    pub const ACTION: &str = "action";

    /// Parameter being bound.
    pub const PARAMETER: &str = "parameter";

    /// Resolution strategy chosen for a parameter.
    pub const STRATEGY: &str = "strategy";

    /// Unresolved-parameter policy.
    pub const POLICY: &str = "policy";

    /// Error message.
    pub const ERROR: &str = "error";

    /// Machine-readable error code.
    pub const ERROR_CODE: &str = "error_code";
}
