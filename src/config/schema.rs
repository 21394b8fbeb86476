//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every section carries defaults matching the deployed edge worker so an
//! empty file (or no file at all) yields a working setup.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origin the routes forward to.
    pub upstream: UpstreamConfig,

    /// Ordered path-prefix routing table.
    pub routes: Vec<RouteConfig>,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Hosting-edge header handling.
    pub edge: EdgeConfig,

    /// Discovery response for unmatched paths.
    pub discovery: DiscoveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            routes: default_routes(),
            cors: CorsConfig::default(),
            edge: EdgeConfig::default(),
            discovery: DiscoveryConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// IP literal or hostname of the backend.
    pub address: String,

    /// "http" or "https".
    pub scheme: String,

    /// Wildcard-DNS domain used to turn IP literals into hostnames.
    /// Empty string connects to the IP directly.
    pub ip_host_suffix: String,

    /// Explicit `Host` header value. Defaults to the resolved authority.
    pub host_header: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            scheme: "http".to_string(),
            ip_host_suffix: "nip.io".to_string(),
            host_header: None,
        }
    }
}

/// A single path-prefix route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Path prefix, e.g. "/chatbot". Stripped before forwarding.
    pub prefix: String,

    /// Upstream port for this prefix.
    pub port: u16,

    /// Per-route upstream address, overriding `upstream.address`.
    #[serde(default)]
    pub host: Option<String>,
}

impl RouteConfig {
    pub fn new(prefix: impl Into<String>, port: u16) -> Self {
        Self {
            prefix: prefix.into(),
            port,
            host: None,
        }
    }
}

/// Deployed default: the chatbot service on port 8000.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig::new("/chatbot", 8000)]
}

/// Cross-origin policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact-match origins that are echoed back.
    pub allowed_origins: Vec<String>,

    /// Allow-origin value for absent or unlisted origins.
    pub default_origin: String,

    pub allow_methods: String,

    pub allow_headers: String,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:4173".to_string(),
            ],
            default_origin: "http://localhost:5173".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization, X-Requested-With".to_string(),
            max_age_secs: 86_400,
        }
    }
}

/// Hosting-edge header handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Header carrying the real client address, set by the edge.
    pub client_ip_header: String,

    /// Believe `client_ip_header` when building `X-Forwarded-For`. Turn off
    /// when clients can reach the proxy without passing through the edge,
    /// otherwise they choose their own forwarded address.
    pub trust_client_ip_header: bool,

    /// Any header starting with one of these prefixes is edge-internal.
    pub internal_header_prefixes: Vec<String>,

    /// Edge-internal headers without a shared prefix.
    pub internal_headers: Vec<String>,

    /// Extra request headers forwarded upstream besides the minimal set.
    pub forward_headers: Vec<String>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            client_ip_header: "cf-connecting-ip".to_string(),
            trust_client_ip_header: true,
            internal_header_prefixes: vec!["cf-".to_string()],
            internal_headers: vec!["cdn-loop".to_string()],
            forward_headers: vec!["authorization".to_string(), "x-requested-with".to_string()],
        }
    }
}

/// Discovery response configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Answer unmatched paths with the service listing instead of a 404.
    pub enabled: bool,

    /// Value of the `worker` field.
    pub worker_name: String,

    /// Overrides the generated usage hint.
    pub usage: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_name: "edge-proxy".to_string(),
            usage: None,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to send response headers, in seconds.
    pub upstream_secs: u64,

    /// Longest silence tolerated between body frames once headers arrived.
    /// A streaming upstream that keeps sending is never cut off.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
