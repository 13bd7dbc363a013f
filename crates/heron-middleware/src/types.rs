//! Request and response types for the pipeline, plus error rendering.

use bytes::Bytes;
use heron_core::DispatchError;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// Same type as [`heron_core::Response`], so action responses pass through
/// untouched.
pub type Response = heron_core::Response;

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates a JSON error response.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;

    /// Renders a dispatch failure as the standard JSON error envelope.
    fn dispatch_error(error: &DispatchError, request_id: Option<&str>) -> Response;
}

impl ResponseExt for Response {
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        json_response(status, body.to_string())
    }

    fn dispatch_error(error: &DispatchError, request_id: Option<&str>) -> Response {
        let envelope = error.to_envelope(request_id);
        // The envelope only holds strings and a unit enum.
        let body = serde_json::to_string(&envelope).unwrap_or_default();
        json_response(error.status_code(), body)
    }
}

fn json_response(status: http::StatusCode, body: String) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{BindingError, ErrorEnvelope};
    use http::StatusCode;
    use http_body_util::BodyExt;

    #[test]
    fn test_json_error_response() {
        let response = Response::json_error(StatusCode::NOT_FOUND, "NO_ROUTE", "no route matched");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_dispatch_error_envelope() {
        let err = DispatchError::from(BindingError::Unresolved {
            parameter: "id".to_string(),
        });
        let response = Response::dispatch_error(&err, Some("req-1"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let envelope: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.error.code, "BINDING_ERROR");
        assert_eq!(envelope.request_id.as_deref(), Some("req-1"));
    }
}
