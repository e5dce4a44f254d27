use axum::Json;
use query_core::PaginatedResult;

pub type JsonBody<T> = Json<T>;
/// `{ "data": [...], "meta": {...} }`
pub type JsonPage<T> = Json<PaginatedResult<T>>;
