//! Edge Proxy Library
//!
//! CORS negotiation, path-prefix routing, header rewriting and streaming
//! forwarding for a single backend origin.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
