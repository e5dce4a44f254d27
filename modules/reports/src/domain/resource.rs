use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use query_core::ListSource;
use query_db::FieldMap;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

/// Stored record of a resource.
pub type Record<R> = <<R as Resource>::Entity as EntityTrait>::Model;

/// Type-erased data source for a resource.
pub type SourceRef<R> = Arc<dyn ListSource<Item = Record<R>, Id = <R as Resource>::Id>>;

/// One report endpoint family: `GET /reports/{NAME}` and `GET /reports/{NAME}/{id}`.
///
/// Everything that differs between resources lives in an impl of this
/// trait; the engine, service and handlers are shared.
pub trait Resource: Send + Sync + 'static {
    /// Path segment, also used in logs and `{NAME}_NOT_FOUND` codes.
    const NAME: &'static str;

    type Entity: EntityTrait;
    /// Path identifier; a value that does not parse is a 400.
    type Id: FromStr + fmt::Display + Send + Sync + 'static;
    /// Wire projection of a record.
    type Dto: Serialize + From<<Self::Entity as EntityTrait>::Model> + Send + 'static;

    /// Filterable and sortable fields, API name to column.
    fn fields() -> FieldMap<Self::Entity>;

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self>;
}
