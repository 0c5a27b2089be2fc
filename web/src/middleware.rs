//! Request tracing for the checkout API.
//!
//! [`correlation_id_layer`] gives every request an `X-Correlation-ID` (the
//! caller's if it is a valid UUID, else a fresh v4), stores it in request
//! extensions and echoes it on the response. The handler runs inside a
//! `checkout_request` span carrying that id plus the checkout identifiers the
//! browser round trip is keyed by:
//!
//! - `session_id`: taken from the `session_id` query parameter when present
//!   (the verify redirect), otherwise recorded by the handler
//! - `event_id`: recorded by the handler once the body is parsed
//!
//! so one purchase can be followed from create through verify to confirm.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{Instrument, Span, field};
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create the request tracing layer.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer installing [`CorrelationIdMiddleware`].
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Wraps each request in a `checkout_request` span.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

type ResponseFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = incoming_correlation_id(req.headers()).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(correlation_id);

        let span = checkout_span(&req, correlation_id);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;
            if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

fn incoming_correlation_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn checkout_span(req: &Request, correlation_id: Uuid) -> Span {
    let span = tracing::info_span!(
        "checkout_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        path = %req.uri().path(),
        session_id = field::Empty,
        event_id = field::Empty,
    );
    if let Some(session_id) = req.uri().query().and_then(session_id_param) {
        span.record("session_id", session_id);
    }
    span
}

/// The non-empty `session_id` query parameter, if any.
fn session_id_param(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "session_id")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Record checkout identifiers on the current request span.
///
/// Fields already set by the middleware are overwritten.
pub fn record_checkout_fields(event_id: Option<&str>, session_id: Option<&str>) {
    let span = Span::current();
    if let Some(event_id) = event_id {
        span.record("event_id", event_id);
    }
    if let Some(session_id) = session_id {
        span.record("session_id", session_id);
    }
}

/// Read the correlation ID the middleware stored on a request.
pub trait CorrelationIdExt {
    /// `None` if [`correlation_id_layer`] is not installed.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl CorrelationIdExt for Request {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}
