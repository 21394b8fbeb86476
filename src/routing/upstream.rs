//! Upstream address construction.
//!
//! Some hosting edges refuse to open connections to bare IP addresses. An IPv4
//! literal is therefore rewritten into a wildcard-DNS hostname that resolves
//! back to the same address (`165.245.177.103` → `165-245-177-103.nip.io`).
//! Hostnames and loopback addresses are used untouched, and an empty suffix
//! disables the rewrite.

use std::net::IpAddr;

use axum::http::uri::{InvalidUri, Uri};

/// A resolved upstream endpoint for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: String,
    host: String,
    port: u16,
}

impl UpstreamTarget {
    pub fn new(scheme: impl Into<String>, address: &str, ip_host_suffix: &str, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: resolve_host(address, ip_host_suffix),
            port,
        }
    }

    /// `host:port`, the default `Host` header value.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full target URI for a rewritten path and the original query string.
    pub fn uri(&self, path: &str, query: Option<&str>) -> Result<Uri, InvalidUri> {
        let target = match query {
            Some(q) => format!("{}://{}{}?{}", self.scheme, self.authority(), path, q),
            None => format!("{}://{}{}", self.scheme, self.authority(), path),
        };
        target.parse()
    }
}

/// Turn a configured address into something usable as a URI host.
pub fn resolve_host(address: &str, ip_host_suffix: &str) -> String {
    let bare = address.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) if !ip_host_suffix.is_empty() && !v4.is_loopback() => {
            let dashed = v4.to_string().replace('.', "-");
            format!("{}.{}", dashed, ip_host_suffix.trim_start_matches('.'))
        }
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        // Wildcard-DNS services do not cover IPv6 reliably; connect directly.
        Ok(IpAddr::V6(v6)) => format!("[{v6}]"),
        Err(_) => address.to_string(),
    }
}
