use std::sync::Arc;

use axum::Router;
use query_core::PageCfg;
use runtime::ReportsConfig;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::domain::resource::Resource;
use crate::domain::service::ReportService;
use crate::infra::storage::{schema, seed};
use crate::resources::{
    AuditEvents, Databases, IndexMetrics, QueryMetrics, Recommendations, TableMetrics,
};

/// Names of every resource served under `/reports/`.
pub const RESOURCE_NAMES: [&str; 6] = [
    Databases::NAME,
    QueryMetrics::NAME,
    IndexMetrics::NAME,
    TableMetrics::NAME,
    Recommendations::NAME,
    AuditEvents::NAME,
];

/// The reports module: storage bootstrap plus the HTTP surface.
pub struct ReportsModule {
    conn: DatabaseConnection,
    cfg: ReportsConfig,
    shutdown: CancellationToken,
}

impl ReportsModule {
    /// `shutdown` is the server's root token; each request gets a child of it.
    pub fn new(conn: DatabaseConnection, cfg: ReportsConfig, shutdown: CancellationToken) -> Self {
        Self {
            conn,
            cfg,
            shutdown,
        }
    }

    /// Create missing tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Creating reports tables");
        schema::create_tables(&self.conn).await
    }

    /// Seed demo rows into empty tables.
    pub async fn seed_demo(&self) -> anyhow::Result<()> {
        seed::seed_demo(&self.conn).await
    }

    /// Effective page limits for `resource`, after per-resource overrides.
    pub fn page_cfg(&self, resource: &str) -> PageCfg {
        let (default_size, max_size) = self.cfg.limits_for(resource);
        PageCfg {
            default_size,
            max_size,
        }
        .normalized()
    }

    pub fn service<R: Resource>(&self) -> Arc<ReportService<R>> {
        let page_cfg = self.page_cfg(R::NAME);
        debug!(
            resource = R::NAME,
            default_size = page_cfg.default_size,
            max_size = page_cfg.max_size,
            "resource registered"
        );
        Arc::new(ReportService::new(
            self.conn.clone(),
            page_cfg,
            self.shutdown.clone(),
        ))
    }

    /// `/health` plus list and get routes for every resource.
    pub fn router(&self) -> Router {
        routes::health_routes()
            .merge(routes::resource_routes(self.service::<Databases>()))
            .merge(routes::resource_routes(self.service::<QueryMetrics>()))
            .merge(routes::resource_routes(self.service::<IndexMetrics>()))
            .merge(routes::resource_routes(self.service::<TableMetrics>()))
            .merge(routes::resource_routes(self.service::<Recommendations>()))
            .merge(routes::resource_routes(self.service::<AuditEvents>()))
    }
}
