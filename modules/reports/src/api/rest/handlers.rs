use std::sync::Arc;

use api_kit::{JsonBody, JsonPage, ListParams, ProblemResponse};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, Uri},
    Json,
};
use tracing::{debug, warn};

use crate::api::rest::error::{map_invalid_id, map_list_error};
use crate::domain::resource::Resource;
use crate::domain::service::ReportService;

/// `GET /reports/{resource}?page=&size=&sort=&filter=`
pub async fn list_handler<R: Resource>(
    State(svc): State<Arc<ReportService<R>>>,
    uri: Uri,
    headers: HeaderMap,
    ListParams(raw): ListParams,
) -> Result<JsonPage<R::Dto>, ProblemResponse> {
    let cancel = svc.request_token();
    match svc.list(&raw, &cancel).await {
        Ok(page) => Ok(Json(page)),
        Err(e) => {
            if e.is_client_error() {
                debug!(resource = R::NAME, error = %e, "list rejected");
            } else {
                warn!(resource = R::NAME, error = %e, "list failed");
            }
            Err(map_list_error::<R>(&e, uri.path(), &headers))
        }
    }
}

/// `GET /reports/{resource}/{id}`
pub async fn get_handler<R: Resource>(
    State(svc): State<Arc<ReportService<R>>>,
    Path(raw_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<JsonBody<R::Dto>, ProblemResponse> {
    let Ok(id) = raw_id.parse::<R::Id>() else {
        debug!(resource = R::NAME, raw_id = %raw_id, "unparseable id");
        return Err(map_invalid_id::<R>(&raw_id, uri.path(), &headers));
    };

    let cancel = svc.request_token();
    svc.get(&id, &cancel)
        .await
        .map(Json)
        .map_err(|e| map_list_error::<R>(&e, uri.path(), &headers))
}

/// Liveness check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
