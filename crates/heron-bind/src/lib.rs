//! # Heron Bind
//!
//! Parameter binding and action invocation for Heron.
//!
//! Given a matched [`Route`](heron_router::Route), this crate rebuilds the
//! argument list its action expects and calls it:
//!
//! 1. [`describe`] - introspect the action into an [`ActionDescriptor`]
//! 2. [`classify`] - pick a [`Strategy`] per parameter
//! 3. [`resolve`] - produce a value from attributes, the container or defaults
//! 4. [`Binder`] - accumulate [`BoundArguments`] in declaration order
//! 5. [`invoke`] - coerce scalars and call the action
//!
//! # Example
//!
//! ```rust
//! use heron_bind::{describe, invoke, Binder};
//! use heron_core::{fixtures, Action};
//! use heron_router::{Route, RouteAttributes};
//!
//! # tokio_test::block_on(async {
//! let container = fixtures::blog_container();
//! let route = Route::new("/posts/{post}/comments/{id}", Action::named("PostController", "show"));
//! let attributes = RouteAttributes::new().with("post", "7").with("id", "99");
//!
//! let descriptor = describe(&route, &container).unwrap();
//! let bound = Binder::default().bind(&descriptor, &attributes, &container).unwrap();
//! let response = invoke(&descriptor, bound).await.unwrap();
//! assert_eq!(response.status(), 200);
//! # });
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod arguments;
mod binder;
mod classifier;
mod descriptor;
mod invoker;
mod resolver;

pub use arguments::{Binding, BoundArguments};
pub use binder::{Binder, UnresolvedPolicy};
pub use classifier::{classify, Strategy};
pub use descriptor::{
    describe, describe_signature, ActionDescriptor, ActionKind, ActionTarget, ParameterDescriptor,
};
pub use invoker::{assemble, invoke};
pub use resolver::resolve;
