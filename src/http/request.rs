//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Extract the (method, path) identity used for override dispatch
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` header is preserved and echoed back
//! - Identity extraction is a trait so hosts that nest or rewrite paths
//!   can supply their own adapter

use axum::extract::{OriginalUri, Request};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer, if any.
pub fn request_id<B>(request: &axum::http::Request<B>) -> Option<&str> {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(&X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        })
}

/// The method and path a request is dispatched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub method: Method,
    pub path: String,
}

/// Extracts a [`RequestIdentity`] from a host request.
pub trait ExtractIdentity: Send + Sync {
    fn extract(&self, request: &Request) -> RequestIdentity;
}

/// Uses the request method and the path of the URI as seen by the router.
///
/// When the autoloaded router is nested under another router, the path seen
/// here is the nested remainder; prefer [`OriginalPathIdentity`] in that case.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriPathIdentity;

impl ExtractIdentity for UriPathIdentity {
    fn extract(&self, request: &Request) -> RequestIdentity {
        RequestIdentity {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
        }
    }
}

/// Uses the original URI recorded by axum before nesting, falling back to the
/// current URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalPathIdentity;

impl ExtractIdentity for OriginalPathIdentity {
    fn extract(&self, request: &Request) -> RequestIdentity {
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        RequestIdentity {
            method: request.method().clone(),
            path,
        }
    }
}

/// Default identity extraction: method plus URI path.
pub fn extract_request_identity(request: &Request) -> RequestIdentity {
    UriPathIdentity.extract(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Uri;

    #[test]
    fn test_identity_ignores_query() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/7?expand=true")
            .body(Body::empty())
            .unwrap();
        let identity = extract_request_identity(&request);
        assert_eq!(identity.method, Method::POST);
        assert_eq!(identity.path, "/users/7");
    }

    #[test]
    fn test_original_path_identity() {
        let mut request = Request::builder()
            .uri("/7")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(OriginalUri(Uri::from_static("/users/7")));

        assert_eq!(OriginalPathIdentity.extract(&request).path, "/users/7");
        assert_eq!(UriPathIdentity.extract(&request).path, "/7");
    }

    #[test]
    fn test_uuid_request_id() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }

    #[test]
    fn test_request_id_falls_back_to_header() {
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&request), Some("abc-123"));
    }
}
