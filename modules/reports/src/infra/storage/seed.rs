//! Deterministic demo rows for `--mock` runs and tests.

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::prelude::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait};
use tracing::info;
use uuid::Uuid;

use super::entity::{
    audit_events, databases, index_metrics, query_metrics, recommendations, table_metrics,
};

pub const DATABASES: usize = 12;
pub const QUERY_METRICS: usize = 30;
pub const INDEX_METRICS: usize = 20;
pub const TABLE_METRICS: usize = 16;
pub const RECOMMENDATIONS: usize = 10;
pub const AUDIT_EVENTS: usize = 40;

const STATUSES: [&str; 3] = ["ONLINE", "OFFLINE", "DEGRADED"];
const APPS: [&str; 4] = ["orders", "billing", "users", "audit"];
const TABLES: [&str; 4] = ["orders", "customers", "invoices", "events"];

/// Id of the `n`-th demo database (0-based).
pub fn database_id(n: usize) -> Uuid {
    Uuid::from_u128(0xdb00_0000 + n as u128 + 1)
}

pub fn recommendation_id(n: usize) -> Uuid {
    Uuid::from_u128(0x7ec0_0000 + n as u128 + 1)
}

fn base_time() -> DateTime<Utc> {
    // 2025-01-01T00:00:00Z
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_089)
}

fn at(day: usize, hour: usize) -> DateTime<Utc> {
    base_time() + Duration::days(day as i64) + Duration::hours(hour as i64)
}

fn on(day: usize) -> NaiveDate {
    at(day, 0).date_naive()
}

pub fn demo_databases() -> Vec<databases::Model> {
    (0..DATABASES)
        .map(|i| {
            let mysql = i % 3 == 1;
            let status = STATUSES[i % 3];
            databases::Model {
                id: database_id(i),
                name: format!("{}-{:02}", APPS[i % 4], i + 1),
                engine: if mysql { "mysql" } else { "postgres" }.to_string(),
                version: (i != DATABASES - 1).then(|| if mysql { "8.0" } else { "16.2" }.to_string()),
                environment: if i % 2 == 0 { "production" } else { "staging" }.to_string(),
                status: status.to_string(),
                region: (i % 4 != 3)
                    .then(|| if i % 2 == 0 { "eu-west-1" } else { "us-east-1" }.to_string()),
                size_bytes: ((i as i64 * 7) % 12 + 1) * 1_048_576,
                created_at: at(i, 9),
                last_seen_at: (status != "OFFLINE").then(|| at(30, i)),
            }
        })
        .collect()
}

pub fn demo_query_metrics() -> Vec<query_metrics::Model> {
    const QUERIES: [&str; 5] = [
        "SELECT * FROM orders WHERE customer_id = $1",
        "UPDATE invoices SET paid = true WHERE id = $1",
        "SELECT count(*) FROM events WHERE created_at > $1",
        "INSERT INTO audit_log (actor, action) VALUES ($1, $2)",
        "DELETE FROM sessions WHERE expires_at < now()",
    ];
    (0..QUERY_METRICS)
        .map(|i| {
            let calls = (i as i64 * 37) % 500 + 1;
            let mean = 0.5 + (i % 10) as f64 * 1.25;
            query_metrics::Model {
                id: i as i64 + 1,
                database_id: database_id(i % DATABASES),
                query_hash: format!("{:016x}", (i as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)),
                query_text: QUERIES[i % QUERIES.len()].to_string(),
                calls,
                total_time_ms: calls as f64 * mean,
                mean_time_ms: mean,
                rows: calls * (i as i64 % 5),
                captured_on: on(i % 7),
                captured_at: at(i % 7, i % 24),
            }
        })
        .collect()
}

pub fn demo_index_metrics() -> Vec<index_metrics::Model> {
    (0..INDEX_METRICS)
        .map(|i| {
            let table = TABLES[i % TABLES.len()];
            let scans = if i % 5 == 0 { 0 } else { i as i64 * 113 };
            index_metrics::Model {
                id: i as i64 + 1,
                database_id: database_id(i % DATABASES),
                owner_table: table.to_string(),
                index_name: format!("{table}_idx_{i}"),
                scans,
                size_bytes: (i as i64 + 1) * 65_536,
                is_unique: i % 4 == 0,
                is_unused: scans == 0,
                captured_at: at(i % 7, 3),
            }
        })
        .collect()
}

pub fn demo_table_metrics() -> Vec<table_metrics::Model> {
    (0..TABLE_METRICS)
        .map(|i| table_metrics::Model {
            id: i as i64 + 1,
            database_id: database_id(i % DATABASES),
            schema_name: if i % 4 == 3 { "archive" } else { "public" }.to_string(),
            relation_name: TABLES[i % TABLES.len()].to_string(),
            row_count: (i as i64 + 1) * 10_000,
            dead_tuples: (i as i64 * 331) % 5_000,
            bloat_ratio: Decimal::new((i as i64 * 37) % 100, 2),
            last_vacuum_at: (i % 3 != 0).then(|| at(i % 7, 2)),
            captured_at: at(i % 7, 4),
        })
        .collect()
}

pub fn demo_recommendations() -> Vec<recommendations::Model> {
    const KINDS: [&str; 4] = ["missing_index", "unused_index", "vacuum", "config"];
    const SEVERITIES: [&str; 3] = ["LOW", "MEDIUM", "HIGH"];
    const STATES: [&str; 3] = ["OPEN", "DISMISSED", "APPLIED"];
    (0..RECOMMENDATIONS)
        .map(|i| {
            let kind = KINDS[i % KINDS.len()];
            recommendations::Model {
                id: recommendation_id(i),
                database_id: database_id(i % DATABASES),
                kind: kind.to_string(),
                severity: SEVERITIES[i % SEVERITIES.len()].to_string(),
                title: format!("{} on {}", kind.replace('_', " "), TABLES[i % TABLES.len()]),
                detail: (i % 2 == 0).then(|| format!("estimated from {} samples", (i + 1) * 100)),
                estimated_gain_pct: (i as f64 * 4.5) % 40.0,
                status: STATES[i % STATES.len()].to_string(),
                created_at: at(i, 12),
            }
        })
        .collect()
}

pub fn demo_audit_events() -> Vec<audit_events::Model> {
    const ACTORS: [&str; 3] = ["alice", "bob", "svc-collector"];
    const ACTIONS: [&str; 4] = ["LOGIN", "EXPORT", "UPDATE_THRESHOLD", "ACK_RECOMMENDATION"];
    (0..AUDIT_EVENTS)
        .map(|i| audit_events::Model {
            id: i as i64 + 1,
            database_id: (i % 4 != 0).then(|| database_id(i % DATABASES)),
            actor: ACTORS[i % ACTORS.len()].to_string(),
            action: ACTIONS[i % ACTIONS.len()].to_string(),
            target: (i % 4 != 0).then(|| TABLES[i % TABLES.len()].to_string()),
            success: i % 7 != 0,
            occurred_on: on(i / 8),
            occurred_at: at(i / 8, i % 24),
        })
        .collect()
}

async fn insert_all<E>(conn: &DatabaseConnection, rows: Vec<E::Model>) -> anyhow::Result<()>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: Send,
{
    let models: Vec<E::ActiveModel> = rows
        .into_iter()
        .map(IntoActiveModel::into_active_model)
        .collect();
    E::insert_many(models)
        .exec_without_returning(conn)
        .await
        .with_context(|| format!("seed {}", E::default().table_name()))?;
    Ok(())
}

/// Insert the demo rows unless `databases` already has data.
pub async fn seed_demo(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let existing = databases::Entity::find()
        .count(conn)
        .await
        .context("count existing databases")?;
    if existing > 0 {
        info!(existing, "demo data already present, skipping seed");
        return Ok(());
    }

    insert_all::<databases::Entity>(conn, demo_databases()).await?;
    insert_all::<query_metrics::Entity>(conn, demo_query_metrics()).await?;
    insert_all::<index_metrics::Entity>(conn, demo_index_metrics()).await?;
    insert_all::<table_metrics::Entity>(conn, demo_table_metrics()).await?;
    insert_all::<recommendations::Entity>(conn, demo_recommendations()).await?;
    insert_all::<audit_events::Entity>(conn, demo_audit_events()).await?;

    info!("demo data seeded");
    Ok(())
}
