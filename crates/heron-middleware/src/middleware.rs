//! The [`Middleware`] trait and the [`Next`] cursor that drives a chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stage of a [`crate::Pipeline`].
///
/// A stage either passes the request on with [`Next::run`] (at most once) or
/// answers it itself.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name used in logs and [`crate::Pipeline::stage_names`].
    fn name(&self) -> &'static str;

    /// Handles `request`, optionally delegating to the rest of the chain.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Terminal handler invoked when every stage passed the request on.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// The stages still to run for one request, followed by the fallback.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    fallback: Handler<'a>,
}

impl<'a> Next<'a> {
    /// Runs `stages` in order, then `fallback`.
    pub fn chain<F>(stages: &'a [Arc<dyn Middleware>], fallback: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            remaining: stages,
            fallback: Box::new(fallback),
        }
    }

    /// Goes straight to `fallback`.
    pub fn handler<F>(fallback: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self::chain(&[], fallback)
    }

    /// Hands the request to the next stage, or to the fallback when none is
    /// left.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.remaining.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    remaining: rest,
                    fallback: self.fallback,
                };
                stage.process(ctx, request, next).await
            }
            None => (self.fallback)(ctx, request).await,
        }
    }
}
