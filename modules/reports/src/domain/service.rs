use std::sync::Arc;

use query_core::{ListEngine, ListError, PageCfg, PaginatedResult, RawListParams};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::domain::resource::{Resource, SourceRef};

/// Read service for one resource: a configured [`ListEngine`] over the
/// resource's data source.
pub struct ReportService<R: Resource> {
    engine: ListEngine,
    source: SourceRef<R>,
    shutdown: CancellationToken,
}

impl<R: Resource> ReportService<R> {
    pub fn new(conn: DatabaseConnection, page_cfg: PageCfg, shutdown: CancellationToken) -> Self {
        let fields = Arc::new(R::fields());
        let engine = ListEngine::builder(R::NAME)
            .whitelist(fields.whitelist())
            .page_cfg(page_cfg)
            .build();
        Self::from_parts(engine, R::source(conn, fields), shutdown)
    }

    /// Assemble from an existing engine and source (tests use in-memory sources).
    pub fn from_parts(engine: ListEngine, source: SourceRef<R>, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            source,
            shutdown,
        }
    }

    pub fn engine(&self) -> &ListEngine {
        &self.engine
    }

    /// Token for one request; cancelled when the server shuts down.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    #[instrument(name = "reports.service.list", skip_all, fields(resource = R::NAME))]
    pub async fn list(
        &self,
        raw: &RawListParams,
        cancel: &CancellationToken,
    ) -> Result<PaginatedResult<R::Dto>, ListError> {
        let page = self.engine.list(raw, &*self.source, cancel).await?;
        debug!(
            returned = page.data.len(),
            item_count = page.meta.item_count,
            "page served"
        );
        Ok(page.map_data(R::Dto::from))
    }

    #[instrument(name = "reports.service.get", skip_all, fields(resource = R::NAME, id = %id))]
    pub async fn get(&self, id: &R::Id, cancel: &CancellationToken) -> Result<R::Dto, ListError> {
        self.engine
            .get(id, &*self.source, cancel)
            .await
            .map(R::Dto::from)
    }
}
