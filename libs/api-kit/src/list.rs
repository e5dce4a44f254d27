//! List-query transport glue: query-string extractor and error → Problem mapping.

use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use query_core::{ListError, RawListParams};

use crate::problem::{Problem, ProblemResponse};

/// Extract `page`, `size`, repeated `sort` and repeated `filter` from the query string.
///
/// Never rejects: validation happens in the engine so that every list error
/// goes through [`list_error_to_problem`].
///
/// ```ignore
/// async fn list_things(ListParams(raw): ListParams) { /* engine.list(&raw, ...) */ }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams(pub RawListParams);

impl ListParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes());
        Self(RawListParams::from_pairs(
            pairs.map(|(k, v)| (k.into_owned(), v.into_owned())),
        ))
    }
}

impl Deref for ListParams {
    type Target = RawListParams;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query()))
    }
}

/// `query-metrics` → `QUERY_METRICS`.
pub fn resource_code(resource: &str) -> String {
    resource
        .chars()
        .map(|c| match c {
            '-' | ' ' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

fn validation_title(code: &str) -> &'static str {
    match code {
        "LIST_UNKNOWN_FIELD" => "Unknown Field",
        "LIST_UNSUPPORTED_OPERATOR" => "Unsupported Operator",
        "LIST_ARITY_MISMATCH" => "Arity Mismatch",
        "LIST_INVALID_VALUE" => "Invalid Value",
        "LIST_INVALID_SORT" => "Invalid Sort",
        _ => "Invalid Filter",
    }
}

/// Map list errors to RFC 9457 Problem responses.
///
/// `Processing` never leaks backend detail; the executor has already logged it.
pub fn list_error_to_problem(e: &ListError, resource: &str, instance: &str) -> ProblemResponse {
    match e {
        ListError::Validation(err) => {
            let code = err.code();
            Problem::new(StatusCode::BAD_REQUEST, validation_title(code), err.to_string())
                .with_code(code)
                .with_instance(instance)
                .into()
        }
        ListError::NotFound { id } => Problem::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("{resource} record '{id}' not found"),
        )
        .with_code(format!("{}_NOT_FOUND", resource_code(resource)))
        .with_instance(instance)
        .into(),
        ListError::Processing => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "An internal error occurred while processing the request",
        )
        .with_code("INTERNAL_DB")
        .with_instance(instance)
        .into(),
        ListError::Cancelled => Problem::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Request Cancelled",
            "The request was cancelled before it completed",
        )
        .with_code("REQUEST_CANCELLED")
        .with_instance(instance)
        .into(),
    }
}

/// 400 for a path identifier that does not parse as the resource's id type.
pub fn invalid_id_problem(resource: &str, raw: &str, instance: &str) -> ProblemResponse {
    Problem::new(
        StatusCode::BAD_REQUEST,
        "Invalid Identifier",
        format!("'{raw}' is not a valid {resource} identifier"),
    )
    .with_code("INVALID_ID")
    .with_instance(instance)
    .into()
}
