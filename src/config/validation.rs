//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect duplicate or malformed route prefixes
//! - Check that CORS origins are real origins
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),
    #[error("no routes configured")]
    NoRoutes,
    #[error("route prefix {0:?} must start with '/' and must not end with '/'")]
    RoutePrefix(String),
    #[error("duplicate route prefix {0:?}")]
    DuplicatePrefix(String),
    #[error("route {0:?} has port 0")]
    RoutePort(String),
    #[error("upstream address is empty")]
    UpstreamAddress,
    #[error("unsupported upstream scheme {0:?}")]
    UpstreamScheme(String),
    #[error("invalid origin {0:?}")]
    Origin(String),
    #[error("timeout {0} must be greater than zero")]
    Timeout(&'static str),
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        let prefix = route.prefix.as_str();
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            errors.push(ValidationError::RoutePrefix(prefix.to_string()));
        }
        if !seen.insert(prefix) {
            errors.push(ValidationError::DuplicatePrefix(prefix.to_string()));
        }
        if route.port == 0 {
            errors.push(ValidationError::RoutePort(prefix.to_string()));
        }
        if route.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            errors.push(ValidationError::UpstreamAddress);
        }
    }

    if config.upstream.address.trim().is_empty() {
        errors.push(ValidationError::UpstreamAddress);
    }

    if !matches!(config.upstream.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::UpstreamScheme(config.upstream.scheme.clone()));
    }

    let origins = std::iter::once(&config.cors.default_origin).chain(&config.cors.allowed_origins);
    for origin in origins {
        if !is_origin(origin) {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Timeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Timeout("upstream_secs"));
    }
    if config.timeouts.idle_secs == 0 {
        errors.push(ValidationError::Timeout("idle_secs"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is scheme + host (+ port), serialized without a path.
fn is_origin(value: &str) -> bool {
    Url::parse(value)
        .is_ok_and(|url| url.has_host() && url.origin().ascii_serialization() == value)
}
