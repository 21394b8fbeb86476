//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (segment-aware prefix match, prefix stripping)
//!     → upstream.rs (host:port of the target, IP → hostname rewrite)
//!     → Return: ResolvedRoute or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[] + UpstreamConfig
//!     → Compile matchers and upstream targets
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (configuration order)

pub mod matcher;
pub mod router;
pub mod upstream;

pub use router::{ResolvedRoute, RouteTable};
pub use upstream::UpstreamTarget;
