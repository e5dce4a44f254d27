//! List query executor: resolve → build → count → find → meta.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::ast::Predicate;
use crate::{
    build_order, build_predicate, resolve_filtering, resolve_pagination, resolve_sorting,
    FieldKind, FieldWhitelist, FilterClause, OrderSpec, PageCfg, PageRequest, PaginatedResult,
    PaginationMeta, SortClause,
};

/// Data-source port for one resource.
///
/// Implementations receive only engine-built predicates and orderings whose
/// fields are all whitelisted. Retry policy, if any, belongs here.
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Send;
    type Id: fmt::Display + Send + Sync;

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64>;

    async fn find(
        &self,
        predicate: &Predicate,
        order: &OrderSpec,
        skip: u64,
        take: u64,
    ) -> anyhow::Result<Vec<Self::Item>>;

    async fn find_by_id(&self, id: &Self::Id) -> anyhow::Result<Option<Self::Item>>;
}

/// Outcome of a failed list or get call.
#[derive(Debug, Error)]
pub enum ListError {
    /// Bad sort/filter input; the data source was not called.
    #[error(transparent)]
    Validation(#[from] crate::Error),

    #[error("record '{id}' not found")]
    NotFound { id: String },

    /// The data source failed. Details are logged, never carried.
    #[error("failed to process the request")]
    Processing,

    #[error("request cancelled")]
    Cancelled,
}

impl ListError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ListError::Validation(_) | ListError::NotFound { .. })
    }
}

/// Raw, unvalidated list parameters as they arrive from the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawListParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Vec<String>,
    pub filter: Vec<String>,
}

impl RawListParams {
    /// Collect `page`, `size`, `sort` and `filter` from decoded query pairs.
    /// Unknown keys are ignored; for `page`/`size` the last value wins.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut out = Self::default();
        for (k, v) in pairs {
            match k.as_ref() {
                "page" => out.page = Some(v.into()),
                "size" => out.size = Some(v.into()),
                "sort" => out.sort.push(v.into()),
                "filter" => out.filter.push(v.into()),
                _ => {}
            }
        }
        out
    }
}

/// Fully validated list request.
#[derive(Clone, Debug, PartialEq)]
pub struct ListRequest {
    pub page: PageRequest,
    pub sort: Vec<SortClause>,
    pub filters: Vec<FilterClause>,
}

/* ---------- data source calls ---------- */

async fn guarded<T>(
    cancel: &CancellationToken,
    op: &'static str,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, ListError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(op, "data source call abandoned: request cancelled");
            Err(ListError::Cancelled)
        }
        res = fut => res.map_err(|e| {
            error!(op, error = ?e, "data source call failed");
            ListError::Processing
        }),
    }
}

/// Run a validated list request against `source`.
///
/// `count` runs first; `find` is skipped when the requested page starts past
/// the last row. Cancelling `cancel` drops the in-flight call.
#[instrument(
    name = "list_query.execute_list",
    skip_all,
    fields(page = page.page(), take = page.take(), filters = filters.len(), sort = sort.len())
)]
pub async fn execute_list<S>(
    page: &PageRequest,
    sort: &[SortClause],
    filters: &[FilterClause],
    source: &S,
    cancel: &CancellationToken,
) -> Result<PaginatedResult<S::Item>, ListError>
where
    S: ListSource + ?Sized,
{
    let predicate = build_predicate(filters)?;
    let order = build_order(sort);
    debug!(%predicate, order = %order.to_signed_tokens(), "executing list query");

    let item_count = guarded(cancel, "count", source.count(&predicate)).await?;

    let data = if page.skip() >= item_count {
        Vec::new()
    } else {
        guarded(
            cancel,
            "find",
            source.find(&predicate, &order, page.skip(), page.take()),
        )
        .await?
    };

    let meta = PaginationMeta::for_request(page, item_count);
    debug!(returned = data.len(), item_count, "list query done");
    Ok(PaginatedResult::new(data, meta))
}

/// Direct lookup by identifier; bypasses the list pipeline.
#[instrument(name = "list_query.execute_get_by_id", skip_all, fields(id = %id))]
pub async fn execute_get_by_id<S>(
    id: &S::Id,
    source: &S,
    cancel: &CancellationToken,
) -> Result<S::Item, ListError>
where
    S: ListSource + ?Sized,
{
    guarded(cancel, "find_by_id", source.find_by_id(id))
        .await?
        .ok_or_else(|| ListError::NotFound { id: id.to_string() })
}

/* ---------- per-resource engine ---------- */

/// List-query engine configured for one resource.
#[derive(Clone, Debug)]
pub struct ListEngine {
    name: String,
    whitelist: FieldWhitelist,
    page_cfg: PageCfg,
}

impl ListEngine {
    pub fn builder(name: impl Into<String>) -> ListEngineBuilder {
        ListEngineBuilder {
            name: name.into(),
            whitelist: FieldWhitelist::new(),
            page_cfg: PageCfg::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn whitelist(&self) -> &FieldWhitelist {
        &self.whitelist
    }

    pub fn page_cfg(&self) -> PageCfg {
        self.page_cfg
    }

    /// Resolve pagination, sorting and filtering in one go.
    pub fn resolve(&self, raw: &RawListParams) -> Result<ListRequest, crate::Error> {
        let page = resolve_pagination(raw.page.as_deref(), raw.size.as_deref(), self.page_cfg);
        let sort_raw: Vec<&str> = raw.sort.iter().map(String::as_str).collect();
        let filter_raw: Vec<&str> = raw.filter.iter().map(String::as_str).collect();
        let sort = resolve_sorting(&sort_raw, &self.whitelist)?;
        let filters = resolve_filtering(&filter_raw, &self.whitelist)?;
        Ok(ListRequest {
            page,
            sort,
            filters,
        })
    }

    #[instrument(name = "list_query.list", skip_all, fields(resource = %self.name))]
    pub async fn list<S>(
        &self,
        raw: &RawListParams,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<PaginatedResult<S::Item>, ListError>
    where
        S: ListSource + ?Sized,
    {
        let req = self.resolve(raw).map_err(|e| {
            debug!(error = %e, "rejected list parameters");
            ListError::Validation(e)
        })?;
        execute_list(&req.page, &req.sort, &req.filters, source, cancel).await
    }

    #[instrument(name = "list_query.get", skip_all, fields(resource = %self.name))]
    pub async fn get<S>(
        &self,
        id: &S::Id,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<S::Item, ListError>
    where
        S: ListSource + ?Sized,
    {
        execute_get_by_id(id, source, cancel).await
    }
}

pub struct ListEngineBuilder {
    name: String,
    whitelist: FieldWhitelist,
    page_cfg: PageCfg,
}

impl ListEngineBuilder {
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.whitelist = self.whitelist.field(name, kind);
        self
    }

    pub fn whitelist(mut self, whitelist: FieldWhitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn page_cfg(mut self, cfg: PageCfg) -> Self {
        self.page_cfg = cfg;
        self
    }

    pub fn default_page_size(mut self, size: u64) -> Self {
        self.page_cfg.default_size = size;
        self
    }

    pub fn max_page_size(mut self, size: u64) -> Self {
        self.page_cfg.max_size = size;
        self
    }

    pub fn build(self) -> ListEngine {
        ListEngine {
            name: self.name,
            whitelist: self.whitelist,
            page_cfg: self.page_cfg.normalized(),
        }
    }
}
