use std::time::Duration;

use axum::{http::StatusCode, middleware::from_fn, Router};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::request_id::{self, MakeReqId, X_REQUEST_ID};

/// Knobs for [`with_http_layers`].
#[derive(Clone, Debug)]
pub struct HttpLayersCfg {
    /// Per-request deadline; `None` disables it.
    pub timeout: Option<Duration>,
    pub cors_enabled: bool,
    pub body_limit_bytes: usize,
}

impl Default for HttpLayersCfg {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            cors_enabled: false,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Wrap `router` in the standard middleware stack.
///
/// Order (outermost to innermost): SetRequestId -> PropagateRequestId ->
/// Trace -> expose_request_id -> Timeout (408) -> CORS -> BodyLimit.
pub fn with_http_layers(router: Router, cfg: &HttpLayersCfg) -> Router {
    let mut router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
    if cfg.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    if let Some(timeout) = cfg.timeout {
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));
    }
    router
        .layer(from_fn(request_id::expose_request_id))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_id::http_span)
                .on_response(request_id::record_outcome),
        )
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeReqId))
}
