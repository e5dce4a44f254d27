//! The report resources. Field names are the camelCase keys of the DTOs, so
//! anything a client sees in a record can be filtered and sorted by the
//! same name.

use std::sync::Arc;

use query_core::FieldKind;
use query_db::{FieldMap, SeaOrmSource};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::api::rest::dto::{
    AuditEventDto, DatabaseDto, IndexMetricDto, QueryMetricDto, RecommendationDto, TableMetricDto,
};
use crate::domain::resource::{Resource, SourceRef};
use crate::infra::storage::entity::{
    audit_events, databases, index_metrics, query_metrics, recommendations, table_metrics,
};

pub struct Databases;

impl Resource for Databases {
    const NAME: &'static str = "databases";
    type Entity = databases::Entity;
    type Id = Uuid;
    type Dto = DatabaseDto;

    fn fields() -> FieldMap<Self::Entity> {
        use databases::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::Uuid)
            .insert("name", C::Name, FieldKind::String)
            .insert("engine", C::Engine, FieldKind::String)
            .insert("version", C::Version, FieldKind::String)
            .insert("environment", C::Environment, FieldKind::String)
            .insert("status", C::Status, FieldKind::String)
            .insert("region", C::Region, FieldKind::String)
            .insert("sizeBytes", C::SizeBytes, FieldKind::I64)
            .insert("createdAt", C::CreatedAt, FieldKind::DateTimeUtc)
            .insert("lastSeenAt", C::LastSeenAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

pub struct QueryMetrics;

impl Resource for QueryMetrics {
    const NAME: &'static str = "query-metrics";
    type Entity = query_metrics::Entity;
    type Id = i64;
    type Dto = QueryMetricDto;

    fn fields() -> FieldMap<Self::Entity> {
        use query_metrics::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::I64)
            .insert("databaseId", C::DatabaseId, FieldKind::Uuid)
            .insert("queryHash", C::QueryHash, FieldKind::String)
            .insert("queryText", C::QueryText, FieldKind::String)
            .insert("calls", C::Calls, FieldKind::I64)
            .insert("totalTimeMs", C::TotalTimeMs, FieldKind::F64)
            .insert("meanTimeMs", C::MeanTimeMs, FieldKind::F64)
            .insert("rows", C::Rows, FieldKind::I64)
            .insert("capturedOn", C::CapturedOn, FieldKind::Date)
            .insert("capturedAt", C::CapturedAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

pub struct IndexMetrics;

impl Resource for IndexMetrics {
    const NAME: &'static str = "index-metrics";
    type Entity = index_metrics::Entity;
    type Id = i64;
    type Dto = IndexMetricDto;

    fn fields() -> FieldMap<Self::Entity> {
        use index_metrics::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::I64)
            .insert("databaseId", C::DatabaseId, FieldKind::Uuid)
            .insert("ownerTable", C::OwnerTable, FieldKind::String)
            .insert("indexName", C::IndexName, FieldKind::String)
            .insert("scans", C::Scans, FieldKind::I64)
            .insert("sizeBytes", C::SizeBytes, FieldKind::I64)
            .insert("isUnique", C::IsUnique, FieldKind::Bool)
            .insert("isUnused", C::IsUnused, FieldKind::Bool)
            .insert("capturedAt", C::CapturedAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

pub struct TableMetrics;

impl Resource for TableMetrics {
    const NAME: &'static str = "table-metrics";
    type Entity = table_metrics::Entity;
    type Id = i64;
    type Dto = TableMetricDto;

    fn fields() -> FieldMap<Self::Entity> {
        use table_metrics::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::I64)
            .insert("databaseId", C::DatabaseId, FieldKind::Uuid)
            .insert("schemaName", C::SchemaName, FieldKind::String)
            .insert("relationName", C::RelationName, FieldKind::String)
            .insert("rowCount", C::RowCount, FieldKind::I64)
            .insert("deadTuples", C::DeadTuples, FieldKind::I64)
            .insert("bloatRatio", C::BloatRatio, FieldKind::Decimal)
            .insert("lastVacuumAt", C::LastVacuumAt, FieldKind::DateTimeUtc)
            .insert("capturedAt", C::CapturedAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

pub struct Recommendations;

impl Resource for Recommendations {
    const NAME: &'static str = "recommendations";
    type Entity = recommendations::Entity;
    type Id = Uuid;
    type Dto = RecommendationDto;

    fn fields() -> FieldMap<Self::Entity> {
        use recommendations::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::Uuid)
            .insert("databaseId", C::DatabaseId, FieldKind::Uuid)
            .insert("kind", C::Kind, FieldKind::String)
            .insert("severity", C::Severity, FieldKind::String)
            .insert("title", C::Title, FieldKind::String)
            .insert("estimatedGainPct", C::EstimatedGainPct, FieldKind::F64)
            .insert("status", C::Status, FieldKind::String)
            .insert("createdAt", C::CreatedAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

pub struct AuditEvents;

impl Resource for AuditEvents {
    const NAME: &'static str = "audit-events";
    type Entity = audit_events::Entity;
    type Id = i64;
    type Dto = AuditEventDto;

    fn fields() -> FieldMap<Self::Entity> {
        use audit_events::Column as C;
        FieldMap::new()
            .insert("id", C::Id, FieldKind::I64)
            .insert("databaseId", C::DatabaseId, FieldKind::Uuid)
            .insert("actor", C::Actor, FieldKind::String)
            .insert("action", C::Action, FieldKind::String)
            .insert("target", C::Target, FieldKind::String)
            .insert("success", C::Success, FieldKind::Bool)
            .insert("occurredOn", C::OccurredOn, FieldKind::Date)
            .insert("occurredAt", C::OccurredAt, FieldKind::DateTimeUtc)
    }

    fn source(conn: DatabaseConnection, fields: Arc<FieldMap<Self::Entity>>) -> SourceRef<Self> {
        Arc::new(SeaOrmSource::new(conn, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_has_id<R: Resource>() {
        let wl = R::fields().whitelist();
        assert!(wl.contains("id"), "{} must expose its primary key", R::NAME);
    }

    #[test]
    fn every_resource_whitelists_its_tiebreaker() {
        assert_has_id::<Databases>();
        assert_has_id::<QueryMetrics>();
        assert_has_id::<IndexMetrics>();
        assert_has_id::<TableMetrics>();
        assert_has_id::<Recommendations>();
        assert_has_id::<AuditEvents>();
    }

    #[test]
    fn field_names_match_dto_keys() {
        let dto = DatabaseDto::from(crate::infra::storage::seed::demo_databases().remove(0));
        let json = serde_json::to_value(dto).unwrap();
        for field in Databases::fields().whitelist().names() {
            assert!(json.get(field).is_some(), "no DTO key for '{field}'");
        }
    }
}
