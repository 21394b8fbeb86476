//! Upstream forwarding.
//!
//! # Responsibilities
//! - Own the outbound HTTP client and its connection pool
//! - Rebuild the request for the upstream (method, URI, headers, body)
//! - Bound the wait for upstream response headers, then the gaps between
//!   body frames
//! - Turn every transport failure into a `GatewayError`
//!
//! # Design Decisions
//! - One attempt per request, no retries
//! - Redirects are relayed, never followed (the legacy client has no
//!   redirect support at all)
//! - Bodies are streamed in both directions; nothing is buffered
//! - Dropping the returned future aborts the upstream exchange, so a client
//!   disconnect cancels the outbound request

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, Uri};
use axum::BoxError;
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time::{Instant, Sleep};

use crate::config::TimeoutConfig;
use crate::http::request::forwards_body;

pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Upstream response body, cut off when the upstream goes quiet.
pub type UpstreamBody = IdleTimeoutBody<Incoming>;

/// Either the upstream response or the reason none was obtained.
pub type ProxyResult = Result<Response<UpstreamBody>, GatewayError>;

/// Failure to obtain a response from the upstream.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("{}", error_chain(.0))]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

impl GatewayError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Timeout(_) => "timeout",
            GatewayError::Upstream(e) if e.is_connect() => "connect",
            GatewayError::Upstream(_) => "upstream",
            GatewayError::InvalidTarget(_) => "invalid_target",
        }
    }
}

/// Render an error with its source chain, e.g.
/// "client error (Connect): tcp connect error: Connection refused (os error 111)".
fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

/// Raised mid-stream when the upstream stops sending body frames.
#[derive(Debug, Error)]
#[error("upstream body stalled for {}s", .0.as_secs())]
pub struct BodyStalled(pub Duration);

/// Body wrapper that fails once no frame has arrived for `idle`.
///
/// The deadline is pushed back on every frame, so long-lived streams stay
/// open as long as the upstream keeps talking.
pub struct IdleTimeoutBody<B> {
    inner: B,
    idle: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl<B> IdleTimeoutBody<B> {
    pub fn new(inner: B, idle: Duration) -> Self {
        Self {
            inner,
            idle,
            sleep: Box::pin(tokio::time::sleep(idle)),
        }
    }
}

impl<B> HttpBody for IdleTimeoutBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(frame) => {
                this.sleep.as_mut().reset(Instant::now() + this.idle);
                Poll::Ready(frame.map(|result| result.map_err(Into::into)))
            }
            Poll::Pending => match this.sleep.as_mut().poll(cx) {
                Poll::Ready(()) => {
                    tracing::warn!(idle_secs = this.idle.as_secs(), "Upstream body stalled");
                    Poll::Ready(Some(Err(BodyStalled(this.idle).into())))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Outbound half of the proxy. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    timeout: Duration,
    idle: Duration,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, rustls::Error> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        // Explicit provider; more than one may be compiled in.
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(provider)?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            timeout: Duration::from_secs(timeouts.upstream_secs),
            idle: Duration::from_secs(timeouts.idle_secs),
        })
    }

    /// Send `request` upstream and wait for the response headers.
    pub async fn forward(&self, request: Request<Body>) -> ProxyResult {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response.map(|body| IdleTimeoutBody::new(body, self.idle))),
            Ok(Err(e)) => Err(GatewayError::Upstream(e)),
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        }
    }
}

/// Assemble the request sent upstream.
pub fn outbound_request(method: Method, uri: Uri, headers: HeaderMap, body: Body) -> Request<Body> {
    let body = if forwards_body(&method) {
        body
    } else {
        Body::empty()
    };

    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    request
}
