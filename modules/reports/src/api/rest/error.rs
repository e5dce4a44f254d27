use api_kit::{invalid_id_problem, list_error_to_problem, request_id, ProblemResponse};
use axum::http::HeaderMap;
use query_core::ListError;

use crate::domain::resource::Resource;

fn with_request_id(problem: ProblemResponse, headers: &HeaderMap) -> ProblemResponse {
    match request_id::from_headers(headers) {
        Some(rid) => problem.with_request_id(rid),
        None => problem,
    }
}

/// Map a list/get failure on `R` to an RFC 9457 response.
pub fn map_list_error<R: Resource>(e: &ListError, instance: &str, headers: &HeaderMap) -> ProblemResponse {
    with_request_id(list_error_to_problem(e, R::NAME, instance), headers)
}

pub fn map_invalid_id<R: Resource>(raw: &str, instance: &str, headers: &HeaderMap) -> ProblemResponse {
    with_request_id(invalid_id_problem(R::NAME, raw, instance), headers)
}
