//! HTTP glue shared by report endpoints: RFC 9457 problems, the list-query
//! extractor, error mapping and the standard middleware stack.

pub mod layers;
pub mod list;
pub mod problem;
pub mod request_id;
pub mod response;

pub use layers::{with_http_layers, HttpLayersCfg};
pub use list::{invalid_id_problem, list_error_to_problem, resource_code, ListParams};
pub use problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use request_id::XRequestId;
pub use response::{JsonBody, JsonPage};
