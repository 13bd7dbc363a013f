//! # Heron Config
//!
//! Typed configuration for the Heron dispatch engine.
//!
//! ```toml
//! [dispatch]
//! unresolved = "reject"   # or "omit"
//! log_bindings = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"         # or "pretty"
//! span_events = false
//! ```
//!
//! Every key can be overridden from the environment as
//! `HERON__SECTION__KEY`, e.g. `HERON__DISPATCH__UNRESOLVED=omit`.
//! Unknown keys in files are rejected.
//!
//! # Example
//!
//! ```
//! use heron_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_string(r#"{"logging": {"format": "pretty"}}"#, "json")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! let options = config.dispatch.to_options();
//! let log_config = config.logging.to_log_config();
//! assert!(options.log_bindings);
//! assert_eq!(log_config.format, heron_telemetry::LogFormat::Pretty);
//! ```

#![doc(html_root_url = "https://docs.rs/heron-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{DispatchConfig, HeronConfig, LoggingConfig};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
