//! Response composition.
//!
//! # Responsibilities
//! - Relay upstream responses with CORS headers overlaid
//! - Synthesize preflight, discovery and gateway-error responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped; status and reason phrase kept verbatim
//! - Upstream error statuses are relayed, never reinterpreted
//! - Transport failures become 502 with a JSON explanation

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::config::DiscoveryConfig;
use crate::http::forward::{GatewayError, UpstreamBody};
use crate::routing::RouteTable;
use crate::security::headers::strip_hop_by_hop;
use crate::security::CorsPolicy;

/// Body of the 502 response.
#[derive(Debug, Serialize)]
pub struct GatewayErrorBody {
    pub error: &'static str,
    pub detail: String,
}

/// Body of the discovery response for unmatched paths.
#[derive(Debug, Serialize)]
pub struct ServiceStatus<'a> {
    pub status: &'static str,
    pub worker: &'a str,
    pub services: Vec<&'a str>,
    pub usage: String,
}

#[derive(Debug, Serialize)]
struct RouteNotFound<'a> {
    error: &'static str,
    path: &'a str,
}

/// 204 with only the CORS header set.
pub fn preflight(cors: HeaderMap) -> Response<Body> {
    (StatusCode::NO_CONTENT, cors).into_response()
}

/// Pass the upstream response through with CORS headers overlaid.
pub fn relay(
    upstream: Response<UpstreamBody>,
    cors: &CorsPolicy,
    origin: Option<&HeaderValue>,
) -> Response<Body> {
    let (mut parts, body) = upstream.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    cors.apply(origin, &mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// 502 carrying the failure reason.
pub fn gateway_failure(err: &GatewayError, cors: HeaderMap) -> Response<Body> {
    let body = GatewayErrorBody {
        error: "Backend unreachable",
        detail: err.to_string(),
    };
    (StatusCode::BAD_GATEWAY, cors, Json(body)).into_response()
}

/// 200 service listing, or 404 when discovery is disabled.
pub fn unmatched(
    path: &str,
    routes: &RouteTable,
    discovery: &DiscoveryConfig,
    cors: HeaderMap,
) -> Response<Body> {
    if !discovery.enabled {
        let body = RouteNotFound {
            error: "No matching route",
            path,
        };
        return (StatusCode::NOT_FOUND, cors, Json(body)).into_response();
    }

    let services = routes.prefixes();
    let usage = discovery
        .usage
        .clone()
        .unwrap_or_else(|| usage_hint(&services));
    let body = ServiceStatus {
        status: "ok",
        worker: &discovery.worker_name,
        services,
        usage,
    };
    (StatusCode::OK, cors, Json(body)).into_response()
}

fn usage_hint(prefixes: &[&str]) -> String {
    match prefixes {
        [only] => format!("Prefix your request path with {only}"),
        many => format!("Prefix your request path with one of: {}", many.join(", ")),
    }
}
