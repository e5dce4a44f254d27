//! Generic list-query engine.
//!
//! Turns untrusted query-string input into validated pagination, sorting and
//! filtering directives, builds a backend-agnostic [`ast::Predicate`] and
//! [`OrderSpec`], runs them against a [`ListSource`] and assembles a uniform
//! [`PaginatedResult`].
//!
//! Everything except the executor is pure and synchronous.

pub mod ast;
pub mod executor;
pub mod filter;
pub mod page;
pub mod sort;
pub mod whitelist;

pub use executor::{
    execute_get_by_id, execute_list, ListEngine, ListEngineBuilder, ListError, ListRequest,
    ListSource, RawListParams,
};
pub use filter::{build_predicate, resolve_filtering, FilterClause, FilterOp, FilterValue};
pub use page::{
    resolve_pagination, PageCfg, PageRequest, PaginatedResult, PaginationMeta,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use sort::{build_order, resolve_sorting, OrderKey, OrderSpec, SortClause, SortDir};
pub use whitelist::{FieldKind, FieldWhitelist, WhitelistedField};

use thiserror::Error;

/// Client-input validation errors raised by the sorting and filtering resolvers.
///
/// Every variant describes a request the engine refused to run; none of them
/// is ever produced after the data source has been called.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    #[error("operator {op} is not applicable to field '{field}'")]
    OperatorNotApplicable { op: FilterOp, field: String },

    #[error("operator {op} expects {expected} value(s), got {got}")]
    ArityMismatch {
        op: FilterOp,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        expected: FieldKind,
        value: String,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid sort: {0}")]
    InvalidSort(String),
}

impl Error {
    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownField(_) | Error::UnknownSortField(_) => "LIST_UNKNOWN_FIELD",
            Error::UnsupportedOperator(_) | Error::OperatorNotApplicable { .. } => {
                "LIST_UNSUPPORTED_OPERATOR"
            }
            Error::ArityMismatch { .. } => "LIST_ARITY_MISMATCH",
            Error::InvalidValue { .. } => "LIST_INVALID_VALUE",
            Error::InvalidFilter(_) => "LIST_INVALID_FILTER",
            Error::InvalidSort(_) => "LIST_INVALID_SORT",
        }
    }
}
