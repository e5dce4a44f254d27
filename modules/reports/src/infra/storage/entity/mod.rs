//! sea-orm entities backing the report resources. The schema is owned by
//! the collectors that write these tables; this crate only reads them.

pub mod audit_events;
pub mod databases;
pub mod index_metrics;
pub mod query_metrics;
pub mod recommendations;
pub mod table_metrics;
