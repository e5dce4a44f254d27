//! Reports HTTP surface over seeded in-memory SQLite.

use std::sync::Arc;

use api_kit::{with_http_layers, HttpLayersCfg, APPLICATION_PROBLEM_JSON};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use query_core::ast::Predicate;
use query_core::{ListEngine, ListSource, OrderSpec};
use reports::api::rest::routes::resource_routes;
use reports::infra::storage::entity::databases;
use reports::infra::storage::seed::{self, database_id};
use reports::resources::Databases;
use reports::{ReportService, ReportsModule, Resource};
use runtime::{ReportsConfig, ResourceLimits};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

async fn connect() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts).await.unwrap()
}

async fn module_with(cfg: ReportsConfig) -> ReportsModule {
    let module = ReportsModule::new(connect().await, cfg, CancellationToken::new());
    module.migrate().await.unwrap();
    module.seed_demo().await.unwrap();
    module
}

async fn app() -> Router {
    module_with(ReportsConfig::default()).await.router()
}

async fn call(app: Router, uri: &str) -> (StatusCode, String, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&bytes).unwrap())
}

async fn get_ok(uri: &str) -> Value {
    let (status, _, json) = call(app().await, uri).await;
    assert_eq!(status, StatusCode::OK, "{uri}: {json}");
    json
}

async fn get_problem(uri: &str, expected: StatusCode) -> Value {
    let (status, content_type, json) = call(app().await, uri).await;
    assert_eq!(status, expected, "{uri}: {json}");
    assert_eq!(content_type, APPLICATION_PROBLEM_JSON);
    assert_eq!(json["status"], expected.as_u16());
    json
}

fn data(json: &Value) -> &Vec<Value> {
    json["data"].as_array().expect("data array")
}

#[tokio::test]
async fn health_is_ok() {
    assert_eq!(get_ok("/health").await, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn default_page_has_envelope_and_meta() {
    let json = get_ok("/reports/databases").await;

    assert_eq!(data(&json).len(), 10);
    assert_eq!(
        json["meta"],
        serde_json::json!({
            "page": 1,
            "take": 10,
            "itemCount": seed::DATABASES,
            "pageCount": 2,
            "hasPreviousPage": false,
            "hasNextPage": true,
        })
    );
    // primary-key order by default
    assert_eq!(data(&json)[0]["id"], database_id(0).to_string());
}

#[tokio::test]
async fn last_page_flags() {
    let json = get_ok("/reports/databases?page=2").await;
    assert_eq!(data(&json).len(), 2);
    assert_eq!(json["meta"]["hasPreviousPage"], true);
    assert_eq!(json["meta"]["hasNextPage"], false);
}

#[tokio::test]
async fn page_and_size_are_clamped() {
    let json = get_ok("/reports/databases?size=10000&page=-5").await;
    assert_eq!(json["meta"]["take"], 100);
    assert_eq!(json["meta"]["page"], 1);
    assert_eq!(data(&json).len(), seed::DATABASES);

    let json = get_ok("/reports/databases?page=0&size=abc").await;
    assert_eq!(json["meta"]["page"], 1);
    assert_eq!(json["meta"]["take"], 10);
}

#[tokio::test]
async fn eq_filter_returns_only_matching_rows() {
    let json = get_ok("/reports/databases?filter=status||EQ||ONLINE").await;
    assert_eq!(json["meta"]["itemCount"], 4);
    assert!(data(&json).iter().all(|r| r["status"] == "ONLINE"));
}

#[tokio::test]
async fn filters_are_combined_with_and() {
    let json =
        get_ok("/reports/databases?filter=status||EQ||ONLINE&filter=environment||EQ||production")
            .await;
    let rows = data(&json);
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r["status"] == "ONLINE" && r["environment"] == "production"));
}

#[tokio::test]
async fn contains_and_is_null() {
    let json = get_ok("/reports/databases?filter=name||CONTAINS||BILL").await;
    assert_eq!(json["meta"]["itemCount"], 3);

    let json = get_ok("/reports/databases?filter=region||IS_NULL").await;
    assert_eq!(json["meta"]["itemCount"], 3);
    assert!(data(&json).iter().all(|r| r["region"].is_null()));
}

#[tokio::test]
async fn sort_desc_is_monotonic() {
    let json = get_ok("/reports/databases?sort=sizeBytes:desc&size=100").await;
    let sizes: Vec<i64> = data(&json)
        .iter()
        .map(|r| r["sizeBytes"].as_i64().unwrap())
        .collect();
    assert_eq!(sizes.len(), seed::DATABASES);
    assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "{sizes:?}");
}

#[tokio::test]
async fn typed_filters_on_other_resources() {
    let json = get_ok("/reports/query-metrics?filter=capturedOn||EQ||2025-01-03").await;
    assert_eq!(json["meta"]["itemCount"], 4);
    assert!(data(&json).iter().all(|r| r["capturedOn"] == "2025-01-03"));

    let json = get_ok("/reports/index-metrics?filter=isUnused||EQ||true").await;
    assert_eq!(json["meta"]["itemCount"], 4);

    let json = get_ok("/reports/audit-events?filter=success||EQ||false").await;
    assert_eq!(json["meta"]["itemCount"], 6);

    let json = get_ok("/reports/recommendations?filter=severity||IN||HIGH,MEDIUM").await;
    assert_eq!(json["meta"]["itemCount"], 6);

    let json = get_ok("/reports/table-metrics?filter=schemaName||EQ||archive").await;
    assert_eq!(json["meta"]["itemCount"], 4);

    let json = get_ok("/reports/table-metrics?filter=bloatRatio||GT||0.5").await;
    assert_eq!(json["meta"]["itemCount"], 7);

    let json = get_ok("/reports/table-metrics?sort=bloatRatio:asc&size=100").await;
    let ratios: Vec<f64> = data(&json).iter().map(|r| decimal(&r["bloatRatio"])).collect();
    assert_eq!(ratios.len(), seed::TABLE_METRICS);
    assert!(ratios.windows(2).all(|w| w[0] <= w[1]), "{ratios:?}");

    let json = get_ok("/reports/recommendations?filter=estimatedGainPct||GT||20").await;
    assert_eq!(json["meta"]["itemCount"], 4);
    assert!(data(&json).iter().all(|r| r["estimatedGainPct"].as_f64().unwrap() > 20.0));

    let json = get_ok(
        "/reports/audit-events?filter=occurredAt||BETWEEN||2025-01-02T00:00:00Z,2025-01-03T12:00:00Z",
    )
    .await;
    assert_eq!(json["meta"]["itemCount"], 8);

    let json = get_ok("/reports/audit-events?filter=occurredAt||GTE||2025-01-04T00:00:00Z").await;
    assert_eq!(json["meta"]["itemCount"], 16);

    let uri = format!("/reports/query-metrics?filter=databaseId||EQ||{}", database_id(0));
    let json = get_ok(&uri).await;
    assert_eq!(json["meta"]["itemCount"], 3);
    assert!(data(&json).iter().all(|r| r["databaseId"] == database_id(0).to_string()));

    let json = get_ok("/reports/query-metrics?filter=capturedOn||GT||2025-01-04&size=100").await;
    assert_eq!(json["meta"]["itemCount"], 12);
    assert!(data(&json).iter().all(|r| r["capturedOn"].as_str().unwrap() > "2025-01-04"));
}

// Decimals may serialize as JSON strings or numbers.
fn decimal(v: &Value) -> f64 {
    match v {
        Value::String(s) => s.parse().unwrap(),
        other => other.as_f64().unwrap(),
    }
}

#[tokio::test]
async fn every_resource_lists() {
    for (name, total) in [
        ("databases", seed::DATABASES),
        ("query-metrics", seed::QUERY_METRICS),
        ("index-metrics", seed::INDEX_METRICS),
        ("table-metrics", seed::TABLE_METRICS),
        ("recommendations", seed::RECOMMENDATIONS),
        ("audit-events", seed::AUDIT_EVENTS),
    ] {
        let json = get_ok(&format!("/reports/{name}")).await;
        assert_eq!(json["meta"]["itemCount"], total, "{name}");
    }
}

#[tokio::test]
async fn validation_errors_are_problems() {
    for (query, code) in [
        ("filter=colour||EQ||blue", "LIST_UNKNOWN_FIELD"),
        ("sort=colour:asc", "LIST_UNKNOWN_FIELD"),
        ("filter=status||LIKE||ON", "LIST_UNSUPPORTED_OPERATOR"),
        ("filter=sizeBytes||BETWEEN||1", "LIST_ARITY_MISMATCH"),
        ("filter=sizeBytes||GT||big", "LIST_INVALID_VALUE"),
        ("filter=status", "LIST_INVALID_FILTER"),
        ("sort=:desc", "LIST_INVALID_SORT"),
    ] {
        let json = get_problem(&format!("/reports/databases?{query}"), StatusCode::BAD_REQUEST).await;
        assert_eq!(json["code"], code, "{query}");
        assert_eq!(json["instance"], "/reports/databases");
    }
}

#[tokio::test]
async fn get_by_id() {
    let json = get_ok(&format!("/reports/databases/{}", database_id(2))).await;
    assert_eq!(json["name"], "users-03");

    let json = get_ok("/reports/query-metrics/7").await;
    assert_eq!(json["id"], 7);
}

#[tokio::test]
async fn unknown_id_is_404() {
    let missing = Uuid::from_u128(42);
    let json = get_problem(&format!("/reports/databases/{missing}"), StatusCode::NOT_FOUND).await;
    assert_eq!(json["code"], "DATABASES_NOT_FOUND");
    assert_eq!(json["instance"], format!("/reports/databases/{missing}"));

    let json = get_problem("/reports/query-metrics/999", StatusCode::NOT_FOUND).await;
    assert_eq!(json["code"], "QUERY_METRICS_NOT_FOUND");
}

#[tokio::test]
async fn unparseable_id_is_400() {
    let json = get_problem("/reports/databases/not-a-uuid", StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "INVALID_ID");

    let json = get_problem("/reports/audit-events/abc", StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "INVALID_ID");
}

#[tokio::test]
async fn per_resource_page_limits() {
    let mut cfg = ReportsConfig::default();
    cfg.resources.insert(
        "audit-events".into(),
        ResourceLimits {
            default_page_size: Some(3),
            max_page_size: Some(5),
        },
    );
    let router = module_with(cfg).await.router();

    let (_, _, json) = call(router.clone(), "/reports/audit-events").await;
    assert_eq!(json["meta"]["take"], 3);
    let (_, _, json) = call(router.clone(), "/reports/audit-events?size=50").await;
    assert_eq!(json["meta"]["take"], 5);
    let (_, _, json) = call(router, "/reports/databases?size=50").await;
    assert_eq!(json["meta"]["take"], 50);
}

#[tokio::test]
async fn problems_carry_the_request_id() {
    let router = with_http_layers(app().await, &HttpLayersCfg::default());
    let resp = router
        .oneshot(
            Request::builder()
                .uri("/reports/databases?filter=nope||EQ||1")
                .header("x-request-id", "rid-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["request_id"], "rid-42");
}

#[tokio::test]
async fn shutdown_cancels_requests() {
    let shutdown = CancellationToken::new();
    let module = ReportsModule::new(connect().await, ReportsConfig::default(), shutdown.clone());
    module.migrate().await.unwrap();
    shutdown.cancel();

    let (status, _, json) = call(module.router(), "/reports/databases").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "REQUEST_CANCELLED");
}

struct BrokenSource;

#[async_trait]
impl ListSource for BrokenSource {
    type Item = databases::Model;
    type Id = Uuid;

    async fn count(&self, _: &Predicate) -> anyhow::Result<u64> {
        anyhow::bail!("no such table: databases_v2")
    }

    async fn find(&self, _: &Predicate, _: &OrderSpec, _: u64, _: u64) -> anyhow::Result<Vec<databases::Model>> {
        anyhow::bail!("no such table: databases_v2")
    }

    async fn find_by_id(&self, _: &Uuid) -> anyhow::Result<Option<databases::Model>> {
        anyhow::bail!("no such table: databases_v2")
    }
}

#[tokio::test]
async fn storage_failures_are_opaque_500s() {
    let engine = ListEngine::builder(Databases::NAME)
        .whitelist(Databases::fields().whitelist())
        .build();
    let svc = Arc::new(ReportService::<Databases>::from_parts(
        engine,
        Arc::new(BrokenSource),
        CancellationToken::new(),
    ));
    let router = resource_routes(svc);

    let (status, _, json) = call(router.clone(), "/reports/databases").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_DB");
    assert!(!json["detail"].as_str().unwrap().contains("databases_v2"));

    let (status, _, _) = call(router, &format!("/reports/databases/{}", database_id(0))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
