//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in configured order
//! - Look up the first route matching a request path
//! - Return the upstream target and rewritten path, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - First match wins; configuration order is the priority

use crate::config::{RouteConfig, UpstreamConfig};
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::upstream::UpstreamTarget;

/// A compiled route: prefix matcher plus where it forwards to.
#[derive(Debug, Clone)]
pub struct Route {
    pub matcher: PathPrefixMatcher,
    pub target: UpstreamTarget,
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub prefix: &'a str,
    pub target: &'a UpstreamTarget,
    /// Path to send upstream, never empty.
    pub path: &'a str,
}

/// Ordered, immutable path-prefix routing table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile the routing table from configuration.
    pub fn from_config(routes: &[RouteConfig], upstream: &UpstreamConfig) -> Self {
        let routes = routes
            .iter()
            .map(|route| {
                let address = route.host.as_deref().unwrap_or(&upstream.address);
                Route {
                    matcher: PathPrefixMatcher::new(route.prefix.clone()),
                    target: UpstreamTarget::new(
                        upstream.scheme.clone(),
                        address,
                        &upstream.ip_host_suffix,
                        route.port,
                    ),
                }
            })
            .collect();

        Self { routes }
    }

    /// Find the first route whose prefix matches `path`.
    pub fn resolve<'a>(&'a self, path: &'a str) -> Option<ResolvedRoute<'a>> {
        self.routes.iter().find_map(|route| {
            route.matcher.strip(path).map(|rewritten| ResolvedRoute {
                prefix: route.matcher.prefix(),
                target: &route.target,
                path: rewritten,
            })
        })
    }

    /// Configured prefixes, in order.
    pub fn prefixes(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.matcher.prefix()).collect()
    }
}
