//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Build the outbound header set from a minimal explicit allow-list
//! - Rewrite `Host` to what the upstream expects
//! - Re-inject the edge-provided client address as `X-Forwarded-For`
//! - Strip hop-by-hop headers
//!
//! # Design Decisions
//! - Start empty and add back, so a header introduced by the edge later is
//!   never leaked upstream
//! - Never trust existing X-Forwarded-* from untrusted sources
//! - Edge-internal headers are refused even when explicitly allow-listed
//!
//! # Trust
//! The client-IP header is only as trustworthy as the path to the proxy. Behind
//! the edge, the edge overwrites it. When clients can connect directly they can
//! set it to anything, so `edge.trust_client_ip_header = false` ignores it and
//! reports the TCP peer instead. The header is stripped either way.

use std::net::SocketAddr;

use axum::http::header::{
    InvalidHeaderName, InvalidHeaderValue, ACCEPT, CONNECTION, CONTENT_TYPE, HOST,
    PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::{EdgeConfig, UpstreamConfig};
use crate::http::X_REQUEST_ID;
use crate::routing::UpstreamTarget;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    KEEP_ALIVE,
    TRANSFER_ENCODING,
    TE,
    TRAILER,
    UPGRADE,
    PROXY_AUTHORIZATION,
    PROXY_AUTHENTICATE,
];

const DEFAULT_MEDIA_TYPE: HeaderValue = HeaderValue::from_static("application/json");

/// Invalid header configuration.
#[derive(Debug, Error)]
pub enum HeaderConfigError {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Remove hop-by-hop headers in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Builds outbound request headers. Immutable after startup.
#[derive(Debug, Clone)]
pub struct HeaderRewriter {
    client_ip_header: HeaderName,
    trust_client_ip_header: bool,
    internal_prefixes: Vec<String>,
    internal_headers: Vec<HeaderName>,
    forward_headers: Vec<HeaderName>,
    host_override: Option<HeaderValue>,
}

impl HeaderRewriter {
    pub fn from_config(
        edge: &EdgeConfig,
        upstream: &UpstreamConfig,
    ) -> Result<Self, HeaderConfigError> {
        let parse = |names: &[String]| -> Result<Vec<HeaderName>, InvalidHeaderName> {
            names.iter().map(|n| HeaderName::try_from(n.as_str())).collect()
        };

        Ok(Self {
            client_ip_header: HeaderName::try_from(edge.client_ip_header.as_str())?,
            trust_client_ip_header: edge.trust_client_ip_header,
            internal_prefixes: edge
                .internal_header_prefixes
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
            internal_headers: parse(&edge.internal_headers)?,
            forward_headers: parse(&edge.forward_headers)?,
            host_override: upstream
                .host_header
                .as_deref()
                .map(HeaderValue::from_str)
                .transpose()?,
        })
    }

    /// True for headers that only make sense to the hosting edge.
    pub fn is_edge_internal(&self, name: &HeaderName) -> bool {
        *name == self.client_ip_header
            || self.internal_headers.contains(name)
            || self
                .internal_prefixes
                .iter()
                .any(|prefix| name.as_str().starts_with(prefix.as_str()))
    }

    /// The real client address: the edge's connecting-IP header when trusted,
    /// else the TCP peer.
    pub fn client_ip(&self, inbound: &HeaderMap, peer: Option<SocketAddr>) -> Option<HeaderValue> {
        inbound
            .get(&self.client_ip_header)
            .filter(|v| self.trust_client_ip_header && !v.is_empty())
            .cloned()
            .or_else(|| peer.and_then(|addr| HeaderValue::from_str(&addr.ip().to_string()).ok()))
    }

    /// The `Host` value sent to `target`.
    pub fn host_value(&self, target: &UpstreamTarget) -> Option<HeaderValue> {
        self.host_override
            .clone()
            .or_else(|| HeaderValue::from_str(&target.authority()).ok())
    }

    /// Build the outbound header set from scratch.
    pub fn build(
        &self,
        inbound: &HeaderMap,
        client_ip: Option<HeaderValue>,
        target: &UpstreamTarget,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(
            CONTENT_TYPE,
            inbound.get(CONTENT_TYPE).cloned().unwrap_or(DEFAULT_MEDIA_TYPE),
        );
        headers.insert(
            ACCEPT,
            inbound.get(ACCEPT).cloned().unwrap_or(DEFAULT_MEDIA_TYPE),
        );

        if let Some(host) = self.host_value(target) {
            headers.insert(HOST, host);
        }

        if let Some(request_id) = inbound.get(X_REQUEST_ID) {
            headers.insert(X_REQUEST_ID, request_id.clone());
        }

        for name in &self.forward_headers {
            if self.is_reserved(name) {
                continue;
            }
            for value in inbound.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        if let Some(ip) = client_ip {
            headers.insert(X_FORWARDED_FOR, ip);
        }

        headers
    }

    /// Names the allow-list may never carry through.
    fn is_reserved(&self, name: &HeaderName) -> bool {
        is_hop_by_hop(name)
            || self.is_edge_internal(name)
            || [HOST, CONTENT_TYPE, ACCEPT, X_FORWARDED_FOR, X_REQUEST_ID].contains(name)
    }
}
