//! Structured logging for the Heron dispatch engine.
//!
//! Heron crates log through `tracing`; this crate installs the subscriber
//! that turns those events into output:
//!
//! - **JSON** (production): one object per line, with the current dispatch
//!   span (`request_id`, `route`, `action`) attached to every event
//! - **Pretty** (development): readable multi-line output including span
//!   open/close events
//!
//! # Example
//!
//! ```rust,no_run
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).expect("logging already initialized");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
