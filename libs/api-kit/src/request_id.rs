//! `x-request-id` handling and the per-request tracing span.
//!
//! The id is assigned (or accepted from the client) by tower-http before the
//! trace layer runs, so [`http_span`], [`expose_request_id`] and problem
//! responses all read the same value through [`from_headers`].

use std::time::Duration;

use axum::extract::MatchedPath;
use axum::http::{HeaderMap, HeaderName, Request};
use axum::{body::Body, middleware::Next, response::Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::field::Empty;
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Prefix under which every report resource is mounted.
const REPORTS_PREFIX: &str = "/reports/";

/// Request id carried by the request, if it is valid UTF-8.
pub fn from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Request id made available to handlers as an extension.
#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

/// Random v4 uuid (simple form) for requests that arrive without an id.
#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Copy the request id into the request extensions as [`XRequestId`].
pub async fn expose_request_id(mut req: Request<Body>, next: Next) -> Response {
    if let Some(rid) = from_headers(req.headers()).map(str::to_owned) {
        req.extensions_mut().insert(XRequestId(rid));
    }
    next.run(req).await
}

/// `/reports/query-metrics/7` → `query-metrics`.
fn resource_of(path: &str) -> Option<&str> {
    path.strip_prefix(REPORTS_PREFIX)?
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}

/// Span for one HTTP request: resource, matched route and request id.
/// `status` and `latency_ms` are filled by [`record_outcome`].
pub fn http_span(req: &Request<Body>) -> Span {
    let path = req.uri().path();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        route = %route,
        resource = %resource_of(path).unwrap_or("-"),
        path = %path,
        request_id = %from_headers(req.headers()).unwrap_or("-"),
        status = Empty,
        latency_ms = Empty,
    )
}

pub fn record_outcome(res: &Response, latency: Duration, span: &Span) {
    span.record("status", res.status().as_u16());
    span.record("latency_ms", latency.as_millis() as u64);
    tracing::debug!(parent: span, status = res.status().as_u16(), "response sent");
}
