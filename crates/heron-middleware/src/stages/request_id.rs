//! Request ID middleware.
//!
//! Every request gets a [`RequestId`] before dispatch so that the dispatch
//! span, error envelopes and the `CurrentRequest` snapshot share one
//! correlation key.
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: used when incoming IDs are trusted and parse as a UUID
//! 2. **Generated UUID v7**: otherwise
//!
//! The ID is always echoed on the response in the `X-Request-ID` header.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use heron_core::RequestId;
use http::HeaderValue;
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or extracts request IDs.
///
/// # Example
///
/// ```
/// use heron_middleware::{Pipeline, RequestIdMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .stage(RequestIdMiddleware::trust_incoming())
///     .build();
/// assert_eq!(pipeline.stage_names(), vec!["request_id"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether to reuse a valid incoming `X-Request-ID`.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that reuses valid incoming `X-Request-ID` headers.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Returns `true` if incoming IDs are reused.
    #[must_use]
    pub fn trusts_incoming(&self) -> bool {
        self.trust_incoming
    }

    fn extract_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self
                .extract_request_id(&request)
                .unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
