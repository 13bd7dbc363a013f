//! # Heron Middleware
//!
//! The async middleware pipeline and the dispatch stage for Heron.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Dispatch ──(no route)──→ fallback handler
//!                          │
//!                          └─ describe → bind → invoke → Response
//! ```
//!
//! | Stage | Middleware  | Purpose                                        |
//! |-------|-------------|------------------------------------------------|
//! | 1     | Request ID  | Generate/propagate request ID (UUID v7)        |
//! | 2     | Dispatch    | Bind the matched route's parameters and invoke |
//!
//! The dispatch stage opens a container scope per request and registers the
//! [`CurrentRequest`] snapshot in it, so concurrent requests never observe
//! each other's request. Dispatch failures are rendered as the standard
//! JSON error envelope at this boundary.
//!
//! ## Example
//!
//! ```
//! use heron_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[1].name(), "dispatch");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod dispatch;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use dispatch::{DispatchMiddleware, DispatchOptions, DispatchOutcome};
pub use middleware::{BoxFuture, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};
pub use request::{CurrentRequest, CURRENT_REQUEST};
pub use stages::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use types::{Request, Response, ResponseExt};
