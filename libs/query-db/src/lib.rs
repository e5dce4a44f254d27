//! sea-orm backend for the list-query engine.
//!
//! Consumes engine-built [`query_core::ast::Predicate`]s and
//! [`query_core::OrderSpec`]s; never parses client input.

pub mod condition;
pub mod source;

pub use condition::{
    predicate_to_condition, BuildError, BuildResult, Field, FieldMap, OrderSpecExt, PredicateExt,
};
pub use source::SeaOrmSource;
