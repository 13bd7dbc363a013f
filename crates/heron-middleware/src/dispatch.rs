//! The dispatch middleware.
//!
//! [`DispatchMiddleware`] is the last pipeline stage before the fallback
//! handler. It reads the matched route from the request's [`RouteAttributes`]
//! extension and runs describe, bind and invoke against a fresh request
//! scope of the container. Requests without a matched route pass through
//! unchanged.

use std::sync::Arc;

use heron_bind::{describe, invoke, Binder, UnresolvedPolicy};
use heron_core::{Container, DispatchError, ErrorCategory, Instance};
use heron_router::RouteAttributes;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::request::{CurrentRequest, CURRENT_REQUEST};
use crate::types::{Request, Response, ResponseExt};

/// Options for [`DispatchMiddleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOptions {
    /// What to do with parameters nothing can satisfy.
    pub unresolved: UnresolvedPolicy,
    /// Emit a debug event per bound parameter.
    pub log_bindings: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::Reject,
            log_bindings: true,
        }
    }
}

/// How a dispatch attempt ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The request carried no matched route; it is handed back unchanged.
    NoRouteMatched(Request),
    /// The action ran and produced a response.
    Responded(Response),
}

/// Binds and invokes the action of the matched route.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::Bytes;
/// use heron_core::{fixtures, Action};
/// use heron_middleware::{DispatchMiddleware, MiddlewareContext, Pipeline, Request};
/// use heron_router::{Route, RouteAttributes};
/// use http_body_util::Full;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .stage(DispatchMiddleware::new(Arc::new(fixtures::blog_container())))
///     .build();
///
/// let route = Arc::new(Route::new("/posts/{post}/comments/{id}", Action::named("PostController", "show")));
/// let mut request: Request = http::Request::builder()
///     .uri("/posts/7/comments/99")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
/// request.extensions_mut().insert(
///     RouteAttributes::for_route(route).with("post", "7").with("id", "99"),
/// );
///
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| unreachable!())
///     .await;
/// assert_eq!(response.status(), 200);
/// # });
/// ```
pub struct DispatchMiddleware {
    container: Arc<dyn Container>,
    binder: Binder,
}

impl DispatchMiddleware {
    /// Creates a dispatcher with default options.
    #[must_use]
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self::with_options(container, DispatchOptions::default())
    }

    /// Creates a dispatcher with the given options.
    #[must_use]
    pub fn with_options(container: Arc<dyn Container>, options: DispatchOptions) -> Self {
        Self {
            container,
            binder: Binder::new(options.unresolved).with_log_bindings(options.log_bindings),
        }
    }

    /// Returns the unresolved-parameter policy in effect.
    #[must_use]
    pub fn policy(&self) -> UnresolvedPolicy {
        self.binder.policy()
    }

    /// Dispatches `request` if it carries a matched route.
    ///
    /// The `CurrentRequest` snapshot is registered in a container scope
    /// private to this request before any parameter is resolved.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`] from introspection, binding or the action.
    pub async fn dispatch(
        &self,
        ctx: &mut MiddlewareContext,
        mut request: Request,
    ) -> Result<DispatchOutcome, DispatchError> {
        let matched = request
            .extensions()
            .get::<RouteAttributes>()
            .is_some_and(|attributes| attributes.route().is_some());
        if !matched {
            return Ok(DispatchOutcome::NoRouteMatched(request));
        }

        let (route, attributes) = request
            .extensions_mut()
            .remove::<RouteAttributes>()
            .unwrap_or_default()
            .split_route();
        let Some(route) = route else {
            return Ok(DispatchOutcome::NoRouteMatched(request));
        };

        let scope = Arc::clone(&self.container).begin_request();
        let current = CurrentRequest::capture(&request, &attributes, ctx.request_id());
        scope.force_singleton(CURRENT_REQUEST, Instance::new(current));
        drop(request);

        let action = route.action().label();
        ctx.set_route(route.pattern(), action.clone());
        let span = tracing::info_span!(
            "dispatch",
            request_id = %ctx.request_id(),
            route = %route.pattern(),
            action = %action
        );

        async {
            let descriptor = describe(&route, scope.as_ref())?;
            let bound = self.binder.bind(&descriptor, &attributes, scope.as_ref())?;
            invoke(&descriptor, bound).await
        }
        .instrument(span)
        .await
        .map(DispatchOutcome::Responded)
    }
}

impl std::fmt::Debug for DispatchMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMiddleware")
            .field("binder", &self.binder)
            .finish_non_exhaustive()
    }
}

impl Middleware for DispatchMiddleware {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.dispatch(ctx, request).await {
                Ok(DispatchOutcome::NoRouteMatched(request)) => next.run(ctx, request).await,
                Ok(DispatchOutcome::Responded(response)) => response,
                Err(err) => {
                    let request_id = ctx.request_id().to_string();
                    if err.category() == ErrorCategory::Internal {
                        tracing::error!(
                            request_id = %request_id,
                            action = ctx.action().unwrap_or_default(),
                            error = %err,
                            "dispatch failed"
                        );
                    } else {
                        tracing::debug!(
                            request_id = %request_id,
                            error_code = err.error_code(),
                            error = %err,
                            "dispatch rejected"
                        );
                    }
                    Response::dispatch_error(&err, Some(&request_id))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use heron_core::action::{text_response, Action, Closure, Signature};
    use heron_core::fixtures::{self, PostController};
    use heron_core::{ActionError, ContextArgs, ServiceContainer, TypeRef};
    use heron_router::Route;
    use http_body_util::{BodyExt, Full};

    fn request_for(route: Option<Route>, attributes: RouteAttributes) -> Request {
        let mut request: Request = http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let attributes = match route {
            Some(route) => {
                let mut with_route = RouteAttributes::for_route(Arc::new(route));
                for (name, value) in attributes.iter() {
                    with_route.insert(name, value.clone());
                }
                with_route
            }
            None => attributes,
        };
        request.extensions_mut().insert(attributes);
        request
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_extension_passes_request_back() {
        let dispatcher = DispatchMiddleware::new(Arc::new(ServiceContainer::new()));
        let request: Request = http::Request::builder()
            .uri("/unrouted")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let mut ctx = MiddlewareContext::new();
        match dispatcher.dispatch(&mut ctx, request).await.unwrap() {
            DispatchOutcome::NoRouteMatched(request) => assert_eq!(request.uri(), "/unrouted"),
            DispatchOutcome::Responded(_) => panic!("nothing should have been dispatched"),
        }
        assert!(ctx.route().is_none());
    }

    #[tokio::test]
    async fn test_attributes_without_route_pass_through_untouched() {
        let dispatcher = DispatchMiddleware::new(Arc::new(ServiceContainer::new()));
        let request = request_for(None, RouteAttributes::new().with("id", "1"));

        let outcome = dispatcher
            .dispatch(&mut MiddlewareContext::new(), request)
            .await
            .unwrap();
        let DispatchOutcome::NoRouteMatched(request) = outcome else {
            panic!("nothing should have been dispatched");
        };
        let attributes = request.extensions().get::<RouteAttributes>().unwrap();
        assert_eq!(attributes.get("id"), Some(&heron_core::Value::from("1")));
    }

    #[tokio::test]
    async fn test_dispatch_records_route_on_context() {
        let dispatcher = DispatchMiddleware::new(Arc::new(fixtures::blog_container()));
        let route = Route::new("/posts", Action::named(PostController::NAME, "index"));

        let mut ctx = MiddlewareContext::new();
        let outcome = dispatcher
            .dispatch(&mut ctx, request_for(Some(route), RouteAttributes::new()))
            .await
            .unwrap();

        let DispatchOutcome::Responded(response) = outcome else {
            panic!("route should have been dispatched");
        };
        assert_eq!(body_text(response).await, "index (0 args)");
        assert_eq!(ctx.route(), Some("/posts"));
        assert_eq!(ctx.action(), Some("PostController@index"));
    }

    #[tokio::test]
    async fn test_current_request_stays_in_request_scope() {
        let container = Arc::new(fixtures::blog_container());
        let dispatcher = DispatchMiddleware::new(container.clone());
        let closure = Closure::new(
            Signature::new().param("request", TypeRef::class::<CurrentRequest>()),
            |args| async move {
                let current = args.instance::<CurrentRequest>("request")?;
                Ok::<_, ActionError>(text_response(current.path().to_string()))
            },
        );
        let route = Route::new("/test", Action::callable(closure));

        let outcome = dispatcher
            .dispatch(&mut MiddlewareContext::new(), request_for(Some(route), RouteAttributes::new()))
            .await
            .unwrap();
        let DispatchOutcome::Responded(response) = outcome else {
            panic!("route should have been dispatched");
        };
        assert_eq!(body_text(response).await, "/test");

        assert!(container.get(CURRENT_REQUEST, &ContextArgs::new()).is_err());
    }

    #[tokio::test]
    async fn test_error_becomes_envelope() {
        let dispatcher = DispatchMiddleware::new(Arc::new(fixtures::blog_container()));
        let route = Route::new("/posts/{post}", Action::named(PostController::NAME, "missing"));
        let request = request_for(Some(route), RouteAttributes::new());

        let mut ctx = MiddlewareContext::new();
        let response = dispatcher
            .process(&mut ctx, request, Next::handler(|_, _| unreachable!()))
            .await;

        assert_eq!(response.status(), 500);
        let body = body_text(response).await;
        assert!(body.contains(&ctx.request_id().to_string()));
    }

    #[test]
    fn test_options() {
        let options = DispatchOptions {
            unresolved: UnresolvedPolicy::Omit,
            log_bindings: false,
        };
        let dispatcher =
            DispatchMiddleware::with_options(Arc::new(ServiceContainer::new()), options);
        assert_eq!(dispatcher.policy(), UnresolvedPolicy::Omit);
        assert_eq!(DispatchOptions::default().unresolved, UnresolvedPolicy::Reject);
    }
}
