use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::storage::entity::{
    audit_events, databases, index_metrics, query_metrics, recommendations, table_metrics,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDto {
    pub id: Uuid,
    pub name: String,
    pub engine: String,
    pub version: Option<String>,
    pub environment: String,
    pub status: String,
    pub region: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetricDto {
    pub id: i64,
    pub database_id: Uuid,
    pub query_hash: String,
    pub query_text: String,
    pub calls: i64,
    pub total_time_ms: f64,
    pub mean_time_ms: f64,
    pub rows: i64,
    pub captured_on: NaiveDate,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetricDto {
    pub id: i64,
    pub database_id: Uuid,
    pub owner_table: String,
    pub index_name: String,
    pub scans: i64,
    pub size_bytes: i64,
    pub is_unique: bool,
    pub is_unused: bool,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetricDto {
    pub id: i64,
    pub database_id: Uuid,
    pub schema_name: String,
    pub relation_name: String,
    pub row_count: i64,
    pub dead_tuples: i64,
    pub bloat_ratio: Decimal,
    pub last_vacuum_at: Option<DateTime<Utc>>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDto {
    pub id: Uuid,
    pub database_id: Uuid,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub detail: Option<String>,
    pub estimated_gain_pct: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventDto {
    pub id: i64,
    pub database_id: Option<Uuid>,
    pub actor: String,
    pub action: String,
    pub target: Option<String>,
    pub success: bool,
    pub occurred_on: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

// Conversions from storage models

impl From<databases::Model> for DatabaseDto {
    fn from(m: databases::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            engine: m.engine,
            version: m.version,
            environment: m.environment,
            status: m.status,
            region: m.region,
            size_bytes: m.size_bytes,
            created_at: m.created_at,
            last_seen_at: m.last_seen_at,
        }
    }
}

impl From<query_metrics::Model> for QueryMetricDto {
    fn from(m: query_metrics::Model) -> Self {
        Self {
            id: m.id,
            database_id: m.database_id,
            query_hash: m.query_hash,
            query_text: m.query_text,
            calls: m.calls,
            total_time_ms: m.total_time_ms,
            mean_time_ms: m.mean_time_ms,
            rows: m.rows,
            captured_on: m.captured_on,
            captured_at: m.captured_at,
        }
    }
}

impl From<index_metrics::Model> for IndexMetricDto {
    fn from(m: index_metrics::Model) -> Self {
        Self {
            id: m.id,
            database_id: m.database_id,
            owner_table: m.owner_table,
            index_name: m.index_name,
            scans: m.scans,
            size_bytes: m.size_bytes,
            is_unique: m.is_unique,
            is_unused: m.is_unused,
            captured_at: m.captured_at,
        }
    }
}

impl From<table_metrics::Model> for TableMetricDto {
    fn from(m: table_metrics::Model) -> Self {
        Self {
            id: m.id,
            database_id: m.database_id,
            schema_name: m.schema_name,
            relation_name: m.relation_name,
            row_count: m.row_count,
            dead_tuples: m.dead_tuples,
            bloat_ratio: m.bloat_ratio,
            last_vacuum_at: m.last_vacuum_at,
            captured_at: m.captured_at,
        }
    }
}

impl From<recommendations::Model> for RecommendationDto {
    fn from(m: recommendations::Model) -> Self {
        Self {
            id: m.id,
            database_id: m.database_id,
            kind: m.kind,
            severity: m.severity,
            title: m.title,
            detail: m.detail,
            estimated_gain_pct: m.estimated_gain_pct,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

impl From<audit_events::Model> for AuditEventDto {
    fn from(m: audit_events::Model) -> Self {
        Self {
            id: m.id,
            database_id: m.database_id,
            actor: m.actor,
            action: m.action,
            target: m.target,
            success: m.success,
            occurred_on: m.occurred_on,
            occurred_at: m.occurred_at,
        }
    }
}
