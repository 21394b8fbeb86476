//! HTTP server setup and the proxy pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener and stop on shutdown
//! - Run each request through classify → resolve → rewrite → forward → compose

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::ORIGIN, Request},
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{DiscoveryConfig, ProxyConfig};
use crate::http::forward::{outbound_request, Forwarder, GatewayError};
use crate::http::request::{is_preflight, request_id};
use crate::http::response;
use crate::observability::metrics::{self, Outcome};
use crate::routing::RouteTable;
use crate::security::{CorsPolicy, HeaderConfigError, HeaderRewriter};

/// Failure to assemble the server from a validated configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid header configuration: {0}")]
    Headers(#[from] HeaderConfigError),
    #[error("TLS client setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub cors: Arc<CorsPolicy>,
    pub headers: Arc<HeaderRewriter>,
    pub discovery: Arc<DiscoveryConfig>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StartupError> {
        let cors = CorsPolicy::from_config(&config.cors).map_err(HeaderConfigError::from)?;
        Ok(Self {
            routes: Arc::new(RouteTable::from_config(&config.routes, &config.upstream)),
            cors: Arc::new(cors),
            headers: Arc::new(HeaderRewriter::from_config(&config.edge, &config.upstream)?),
            discovery: Arc::new(config.discovery.clone()),
            forwarder: Forwarder::new(&config.timeouts)?,
        })
    }
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for driving the pipeline without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Classifies the request, resolves its route, and forwards it.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let origin = request.headers().get(ORIGIN).cloned();
    let cors_headers = || state.cors.headers(origin.as_ref());

    // 1. Classify
    if is_preflight(&method) {
        tracing::debug!(request_id = %request_id, "Answering preflight");
        metrics::record_request(method.as_str(), 204, Outcome::Preflight, start_time);
        return response::preflight(cors_headers());
    }

    // 2. Resolve
    let path = request.uri().path().to_string();
    let Some(route) = state.routes.resolve(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        let response = response::unmatched(&path, &state.routes, &state.discovery, cors_headers());
        let outcome = if state.discovery.enabled {
            Outcome::Discovery
        } else {
            Outcome::NotFound
        };
        metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start_time);
        return response;
    };

    let uri = match route.target.uri(route.path, request.uri().query()) {
        Ok(uri) => uri,
        Err(e) => {
            let err = GatewayError::InvalidTarget(e.to_string());
            return gateway_failure(&request_id, &method, &err, cors_headers(), start_time);
        }
    };

    // 3. Rewrite headers
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = state.headers.client_ip(request.headers(), peer);
    let headers = state.headers.build(request.headers(), client_ip, route.target);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        prefix = %route.prefix,
        target = %uri,
        "Proxying request"
    );

    // 4. Forward
    let outbound = outbound_request(method.clone(), uri, headers, request.into_body());

    // 5. Compose
    match state.forwarder.forward(outbound).await {
        Ok(upstream) => {
            let status = upstream.status();
            tracing::debug!(request_id = %request_id, status = %status, "Upstream responded");
            metrics::record_request(method.as_str(), status.as_u16(), Outcome::Upstream, start_time);
            response::relay(upstream, &state.cors, origin.as_ref())
        }
        Err(err) => gateway_failure(&request_id, &method, &err, cors_headers(), start_time),
    }
}

fn gateway_failure(
    request_id: &str,
    method: &axum::http::Method,
    err: &GatewayError,
    cors: axum::http::HeaderMap,
    start_time: Instant,
) -> Response {
    tracing::error!(request_id = %request_id, error = %err, "Upstream error");
    metrics::record_upstream_failure(err.kind());
    metrics::record_request(method.as_str(), 502, Outcome::GatewayError, start_time);
    response::gateway_failure(err, cors)
}
