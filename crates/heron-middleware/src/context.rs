//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the request ID, timing, what the dispatcher matched, and typed extensions
//! that stages can share.

use heron_core::RequestId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use heron_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_route("/posts/{post}", "PostController@show");
///
/// assert_eq!(ctx.route(), Some("/posts/{post}"));
/// assert_eq!(ctx.action(), Some("PostController@show"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Pattern of the matched route, once dispatch starts.
    route: Option<String>,

    /// Label of the dispatched action.
    action: Option<String>,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was provided by a client or upstream service.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            action: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    ///
    /// This should only be called by the request ID stage.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the matched route pattern, if dispatch matched one.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the dispatched action label.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Records the matched route and its action.
    ///
    /// This is set by the dispatch stage.
    pub fn set_route(&mut self, pattern: impl Into<String>, action: impl Into<String>) {
        self.route = Some(pattern.into());
        self.action = Some(action.into());
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_middleware::context::MiddlewareContext;
    ///
    /// struct BindingCount(usize);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(BindingCount(2));
    ///
    /// assert_eq!(ctx.get_extension::<BindingCount>().unwrap().0, 2);
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
