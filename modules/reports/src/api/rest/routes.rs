use std::sync::Arc;

use axum::{routing::get, Router};

use crate::api::rest::handlers;
use crate::domain::resource::Resource;
use crate::domain::service::ReportService;

/// Routes of one resource, with its service as state.
pub fn resource_routes<R: Resource>(service: Arc<ReportService<R>>) -> Router {
    let base = format!("/reports/{}", R::NAME);
    Router::new()
        .route(&base, get(handlers::list_handler::<R>))
        .route(&format!("{base}/{{id}}"), get(handlers::get_handler::<R>))
        .with_state(service)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
