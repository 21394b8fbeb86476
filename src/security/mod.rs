//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (allow-origin decision, preflight header set)
//!     → headers.rs (minimal outbound set, strip edge-internal, add X-Forwarded-For)
//!     → Forward to upstream
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → cors.rs (overlay CORS headers, merge Vary)
//! ```
//!
//! # Design Decisions
//! - No trust in client or edge-supplied forwarding headers
//! - Unlisted origins never get their own value reflected

pub mod cors;
pub mod headers;

pub use cors::CorsPolicy;
pub use headers::{HeaderConfigError, HeaderRewriter};
