//! Fixed-order middleware pipeline.
//!
//! Requests flow through the configured stages in the order they were added
//! and end at a fallback handler when no stage produced a response.
//!
//! ## Pipeline Stages
//!
//! A dispatching pipeline has two stages:
//!
//! 1. **Request ID** - Generate or propagate the request ID (UUID v7)
//! 2. **Dispatch** - Bind and invoke the matched route's action
//!
//! The fallback handler receives requests without a matched route.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable chain of middleware stages.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use heron_core::action::text_response;
/// use heron_middleware::{MiddlewareContext, Pipeline, Request, RequestIdMiddleware};
/// use http_body_util::Full;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder().stage(RequestIdMiddleware::new()).build();
///
/// let request: Request = http::Request::builder()
///     .uri("/")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { text_response("fallback") })
///     })
///     .await;
///
/// assert!(response.headers().contains_key("x-request-id"));
/// # });
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through the entire pipeline.
    ///
    /// `fallback` runs when every stage passed the request on.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        fallback: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        Next::chain(&self.stages, fallback).run(&mut ctx, request).await
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware stage.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The stages of a dispatching pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Request ID generation/propagation
    RequestId = 1,
    /// Stage 2: Action binding and invocation
    Dispatch = 2,
}

impl Stage {
    /// Returns the stage name, as reported by [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Dispatch => "dispatch",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 2] {
        [Self::RequestId, Self::Dispatch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A test middleware that records its invocation order.
    struct OrderTrackingMiddleware {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            let counter = self.counter.clone();
            let order = self.order.clone();
            let name = self.name;

            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                order.lock().unwrap().push(name);
                next.run(ctx, request).await
            })
        }
    }

    /// Answers without calling the rest of the chain.
    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn name(&self) -> &'static str {
            "short_circuit"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut MiddlewareContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::ACCEPTED)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn fallback(_ctx: &mut MiddlewareContext, _req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async {
            HttpResponse::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("fallback")))
                .unwrap()
        })
    }

    fn tracker(
        name: &'static str,
        counter: &Arc<AtomicUsize>,
        order: &Arc<std::sync::Mutex<Vec<&'static str>>>,
    ) -> OrderTrackingMiddleware {
        OrderTrackingMiddleware {
            name,
            counter: counter.clone(),
            order: order.clone(),
        }
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .stage(tracker("first", &counter, &order))
            .stage(tracker("second", &counter, &order))
            .stage(tracker("third", &counter, &order))
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), fallback)
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(pipeline.stage_names(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_later_stages() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .stage(ShortCircuit)
            .stage(tracker("never", &counter, &order))
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), fallback)
            .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_pipeline_reaches_fallback() {
        let pipeline = Pipeline::builder().build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), fallback)
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::RequestId < Stage::Dispatch);
        assert_eq!(Stage::all(), [Stage::RequestId, Stage::Dispatch]);
        assert_eq!(Stage::RequestId.name(), "request_id");
        assert_eq!(Stage::Dispatch.name(), "dispatch");
    }
}
