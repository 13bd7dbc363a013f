//! The request-scoped "current request" snapshot.
//!
//! [`DispatchMiddleware`](crate::DispatchMiddleware) registers a
//! [`CurrentRequest`] in the request's container scope under
//! [`CURRENT_REQUEST`] before binding starts, so request-aware services and
//! actions can resolve it like any other dependency.

use heron_core::RequestId;
use heron_router::RouteAttributes;
use http::{HeaderMap, Method, Uri};

use crate::types::Request;

/// Container key of the [`CurrentRequest`] singleton.
///
/// Equal to `std::any::type_name::<CurrentRequest>()`, so a parameter
/// declared as `TypeRef::class::<CurrentRequest>()` resolves to it.
pub const CURRENT_REQUEST: &str = "heron_middleware::request::CurrentRequest";

/// What an action or service can know about the request being dispatched.
///
/// The body is not part of the snapshot.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use heron_core::RequestId;
/// use heron_middleware::{CurrentRequest, Request};
/// use heron_router::RouteAttributes;
/// use http_body_util::Full;
///
/// let request: Request = http::Request::builder()
///     .uri("/posts/7")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
/// let attributes = RouteAttributes::new().with("post", "7");
///
/// let current = CurrentRequest::capture(&request, &attributes, RequestId::new());
/// assert_eq!(current.path(), "/posts/7");
/// assert_eq!(current.attribute("post").and_then(|v| v.as_str()), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct CurrentRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    attributes: RouteAttributes,
    request_id: RequestId,
}

impl CurrentRequest {
    /// Snapshots `request` together with its route attributes.
    #[must_use]
    pub fn capture(request: &Request, attributes: &RouteAttributes, request_id: RequestId) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            attributes: attributes.clone(),
            request_id,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as text, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the route attributes, without the matched route entry.
    #[must_use]
    pub fn attributes(&self) -> &RouteAttributes {
        &self.attributes
    }

    /// Returns a single route attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&heron_core::Value> {
        self.attributes.get(name)
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}
