//! # Heron
//!
//! An action binding and invocation engine.
//!
//! Heron sits between a router and the code that handles a request. Given a
//! matched route and its attributes, it works out what every parameter of the
//! route's action needs (a route value, a service from the container, a
//! hydrated entity or a declared default), builds the argument list and
//! calls the action.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use heron::prelude::*;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! let pipeline = heron::build_dispatcher(&config, Arc::new(fixtures::blog_container()));
//!
//! assert_eq!(pipeline.stage_names(), vec!["request_id", "dispatch"]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → Dispatch ─→ describe → classify → resolve → invoke
//!                          │
//!                          └─(no route)→ fallback handler
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

// Re-export member crates
pub use heron_bind as bind;
pub use heron_config as config;
pub use heron_core as core;
pub use heron_middleware as middleware;
pub use heron_router as router;
pub use heron_telemetry as telemetry;

use heron_config::HeronConfig;
use heron_core::Container;
use heron_middleware::{DispatchMiddleware, Pipeline, RequestIdMiddleware};

/// Builds the standard two-stage pipeline for `container`.
///
/// Dispatch options come from `config.dispatch`.
#[must_use]
pub fn build_dispatcher(config: &HeronConfig, container: Arc<dyn Container>) -> Pipeline {
    Pipeline::builder()
        .stage(RequestIdMiddleware::new())
        .stage(DispatchMiddleware::with_options(
            container,
            config.dispatch.to_options(),
        ))
        .build()
}

/// Installs the global logging subscriber described by `config.logging`.
///
/// # Errors
///
/// Fails if the level is invalid or a subscriber is already installed.
pub fn init_logging(config: &HeronConfig) -> heron_telemetry::TelemetryResult<()> {
    heron_telemetry::init_logging(&config.logging.to_log_config())
}

/// Commonly used types.
///
/// ```
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use heron_core::action::{text_response, Arguments, Closure, Signature};
    pub use heron_core::di::Lifetime;
    pub use heron_core::{
        fixtures, Action, ActionError, Container, ContextArgs, Controller, DispatchError, Entity,
        Instance, RequestId, Response, ScalarType, ServiceContainer, TypeKind, TypeRef, Value,
    };

    pub use heron_router::{Route, RouteAttributes, ROUTE_ATTRIBUTE};

    pub use heron_bind::{describe, invoke, Binder, Strategy, UnresolvedPolicy};

    pub use heron_middleware::{
        CurrentRequest, DispatchMiddleware, DispatchOptions, MiddlewareContext, Pipeline, Request,
        RequestIdMiddleware, CURRENT_REQUEST,
    };

    pub use heron_config::{ConfigLoader, HeronConfig};
}
