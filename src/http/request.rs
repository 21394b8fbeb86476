//! Request classification.
//!
//! # Responsibilities
//! - Decide whether a request is a CORS preflight
//! - Decide whether a request body may be forwarded
//! - Expose the request ID assigned by the middleware stack
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Original request preserved for logging; a rebuilt copy is forwarded

use axum::http::{HeaderMap, HeaderName, Method};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Browsers send `OPTIONS` before non-simple cross-origin requests.
pub fn is_preflight(method: &Method) -> bool {
    method == Method::OPTIONS
}

/// `GET` and `HEAD` never carry a body upstream, even if the client sent one.
pub fn forwards_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// The request ID, or "unknown" outside the middleware stack.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn only_options_is_preflight() {
        assert!(is_preflight(&Method::OPTIONS));
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            assert!(!is_preflight(&method));
        }
    }

    #[test]
    fn body_dropped_for_get_and_head() {
        assert!(!forwards_body(&Method::GET));
        assert!(!forwards_body(&Method::HEAD));
        assert!(forwards_body(&Method::POST));
        assert!(forwards_body(&Method::PUT));
        assert!(forwards_body(&Method::PATCH));
        assert!(forwards_body(&Method::DELETE));
    }

    #[test]
    fn request_id_falls_back() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }
}
