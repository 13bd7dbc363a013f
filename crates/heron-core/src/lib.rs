//! # Heron Core
//!
//! Core types and traits for the Heron action dispatch engine.
//!
//! This crate provides the foundational types used throughout Heron:
//!
//! - [`Value`] and [`Instance`] - dynamically typed arguments and container objects
//! - [`Entity`] - capability of persisted domain records
//! - [`action`] - controllers, closures and their declared signatures
//! - [`di`] - the container contract and the reference [`ServiceContainer`]
//! - [`DispatchError`] - the error taxonomy surfaced to the pipeline
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
mod context;
pub mod di;
pub mod error;
pub mod fixtures;
pub mod value;

pub use action::{Action, Arguments, Closure, Controller, Response, Signature, TypeKind, TypeRef};
pub use context::RequestId;
pub use di::{Container, ContextArgs, RequestScope, ServiceContainer};
pub use error::{
    ActionError, BindingError, DispatchError, DispatchResult, ErrorCategory, ErrorEnvelope,
    HydrationError, IntrospectionError, ResolutionError,
};
pub use value::{Entity, Instance, ScalarType, Value};
