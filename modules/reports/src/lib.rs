//! Report endpoints over the monitoring store: database inventory, query,
//! index and table metrics, recommendations and audit events. Each resource
//! is a [`Resource`] impl served by the shared list-query engine.

pub mod module;
pub mod resources;
pub use module::{ReportsModule, RESOURCE_NAMES};

pub use domain::resource::Resource;
pub use domain::service::ReportService;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
