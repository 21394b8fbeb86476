//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (preflight? body allowed?)
//!     → [routing layer resolves the upstream target]
//!     → [security layer builds outbound headers]
//!     → forward.rs (single upstream attempt, bounded wait)
//!     → response.rs (relay or synthesize, attach CORS)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{BodyStalled, Forwarder, GatewayError, IdleTimeoutBody, ProxyResult, UpstreamBody};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, StartupError};
