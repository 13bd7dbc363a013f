//! Matched routes and route attributes for Heron.
//!
//! Route matching happens upstream. This crate only models its result:
//!
//! - [`Route`] - pattern, optional segments and the [`Action`](heron_core::Action) to dispatch
//! - [`RouteAttributes`] - the values extracted for a request plus the matched route
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use heron_core::{Action, Value};
//! use heron_router::{Route, RouteAttributes, ROUTE_ATTRIBUTE};
//!
//! let route = Arc::new(Route::new(
//!     "/posts/{post}/comments/{id}",
//!     Action::named("PostController", "show"),
//! ));
//!
//! let attributes = RouteAttributes::for_route(route)
//!     .with("post", "7")
//!     .with("id", "99");
//!
//! assert_eq!(attributes.get("id"), Some(&Value::from("99")));
//! assert!(attributes.get(ROUTE_ATTRIBUTE).is_none());
//! assert!(attributes.route().is_some());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attributes;
mod route;

pub use attributes::{Attribute, RouteAttributes, ROUTE_ATTRIBUTE};
pub use route::{Route, Segment, SegmentKind};
