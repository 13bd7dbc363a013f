//! Built-in middleware stages.

pub mod request_id;

pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
