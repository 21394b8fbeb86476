//! Cross-origin policy.
//!
//! # Responsibilities
//! - Pick the `Access-Control-Allow-Origin` value for a request
//! - Produce the fixed CORS header set for every response kind
//! - Keep shared caches correct with `Vary: Origin`
//!
//! # Design Decisions
//! - Allow-listed origins are echoed exactly; anything else gets the
//!   configured default, never a reflection of the unlisted origin
//! - Header values are validated once at startup
//! - CORS headers overwrite upstream values; `Vary` is merged instead

use std::collections::HashSet;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, VARY,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue};

use crate::config::CorsConfig;

/// Immutable CORS policy built from configuration.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
    default_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allowed_origins: config.allowed_origins.iter().cloned().collect(),
            default_origin: HeaderValue::from_str(&config.default_origin)?,
            allow_methods: HeaderValue::from_str(&config.allow_methods)?,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// The allow-origin value for a request carrying `origin`.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|value| {
                value
                    .to_str()
                    .is_ok_and(|o| self.allowed_origins.contains(o))
            })
            .cloned()
            .unwrap_or_else(|| self.default_origin.clone())
    }

    /// Whether the allow-origin value depends on the request.
    pub fn varies_by_origin(&self) -> bool {
        !self.allowed_origins.is_empty()
    }

    /// Overlay the CORS header set onto `headers`.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(origin));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());

        if self.varies_by_origin() {
            append_vary_origin(headers);
        }
    }

    /// A fresh header map holding only the CORS set.
    pub fn headers(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.apply(origin, &mut headers);
        headers
    }
}

/// Add `Origin` to `Vary` unless it (or `*`) is already listed.
fn append_vary_origin(headers: &mut HeaderMap) {
    let covered = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|token| token == "*" || token.eq_ignore_ascii_case("origin"));

    if !covered {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::from_config(&CorsConfig {
            allowed_origins: vec![
                "https://example-allowed.test".into(),
                "http://localhost:5173".into(),
            ],
            default_origin: "https://default.test".into(),
            ..CorsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn allow_listed_origin_is_echoed() {
        let origin = HeaderValue::from_static("https://example-allowed.test");
        assert_eq!(policy().allow_origin(Some(&origin)), origin);
    }

    #[test]
    fn unlisted_or_missing_origin_gets_default() {
        let policy = policy();
        let evil = HeaderValue::from_static("https://evil.test");
        assert_eq!(policy.allow_origin(Some(&evil)), "https://default.test");
        assert_eq!(policy.allow_origin(None), "https://default.test");

        // Exact match only.
        let near = HeaderValue::from_static("https://example-allowed.test/");
        assert_eq!(policy.allow_origin(Some(&near)), "https://default.test");
    }

    #[test]
    fn full_header_set() {
        let headers = policy().headers(None);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://default.test");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, X-Requested-With"
        );
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
        assert_eq!(headers[VARY], "Origin");
    }

    #[test]
    fn overlay_replaces_upstream_cors_and_merges_vary() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));

        policy().apply(None, &mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://default.test");
        let vary: Vec<_> = headers.get_all(VARY).iter().collect();
        assert_eq!(vary, vec!["Accept-Encoding", "Origin"]);
    }

    #[test]
    fn vary_not_duplicated() {
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("origin, accept"));
        policy().apply(None, &mut headers);
        assert_eq!(headers.get_all(VARY).iter().count(), 1);
    }

    #[test]
    fn empty_allow_list_never_varies() {
        let policy = CorsPolicy::from_config(&CorsConfig {
            allowed_origins: Vec::new(),
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.headers(None).get(VARY).is_none());
    }
}
