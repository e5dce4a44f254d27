//! Executor behavior against an in-memory data source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use query_core::ast::{CompareOperator, Predicate, Value};
use query_core::{
    execute_get_by_id, execute_list, FieldKind, FilterClause, FilterOp, FilterValue, ListEngine,
    ListError, ListSource, OrderSpec, PageCfg, PageRequest, RawListParams, SortDir,
};

#[derive(Clone, Debug, PartialEq)]
struct Db {
    id: u32,
    name: String,
    status: String,
}

#[derive(Default)]
struct Calls {
    count: AtomicUsize,
    find: AtomicUsize,
    find_by_id: AtomicUsize,
}

impl Calls {
    fn total(&self) -> usize {
        self.count.load(Ordering::SeqCst)
            + self.find.load(Ordering::SeqCst)
            + self.find_by_id.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Ok,
    Fail,
    Hang,
}

struct MemSource {
    rows: Vec<Db>,
    calls: Calls,
    mode: Mode,
}

impl MemSource {
    fn new(rows: Vec<Db>) -> Self {
        Self {
            rows,
            calls: Calls::default(),
            mode: Mode::Ok,
        }
    }

    fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    async fn gate(&self) -> anyhow::Result<()> {
        match self.mode {
            Mode::Ok => Ok(()),
            Mode::Fail => anyhow::bail!("connection reset by peer (10.0.0.5:5432)"),
            Mode::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn matches(row: &Db, p: &Predicate) -> bool {
        match p {
            Predicate::All(nodes) => nodes.iter().all(|n| Self::matches(row, n)),
            Predicate::Compare {
                field,
                op: CompareOperator::Eq,
                value: Value::String(s),
            } if field == "status" => &row.status == s,
            Predicate::In { field, values } if field == "status" => values
                .iter()
                .any(|v| matches!(v, Value::String(s) if s == &row.status)),
            other => panic!("unsupported predicate in test source: {other:?}"),
        }
    }
}

#[async_trait]
impl ListSource for MemSource {
    type Item = Db;
    type Id = u32;

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        self.calls.count.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.rows.iter().filter(|r| Self::matches(r, predicate)).count() as u64)
    }

    async fn find(
        &self,
        predicate: &Predicate,
        order: &OrderSpec,
        skip: u64,
        take: u64,
    ) -> anyhow::Result<Vec<Db>> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        let mut rows: Vec<Db> = self
            .rows
            .iter()
            .filter(|r| Self::matches(r, predicate))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        for key in order.iter().rev() {
            match (key.field.as_str(), key.dir) {
                ("name", SortDir::Asc) => rows.sort_by(|a, b| a.name.cmp(&b.name)),
                ("name", SortDir::Desc) => rows.sort_by(|a, b| b.name.cmp(&a.name)),
                ("id", SortDir::Desc) => rows.sort_by(|a, b| b.id.cmp(&a.id)),
                _ => {}
            }
        }
        Ok(rows
            .into_iter()
            .skip(skip as usize)
            .take(take as usize)
            .collect())
    }

    async fn find_by_id(&self, id: &u32) -> anyhow::Result<Option<Db>> {
        self.calls.find_by_id.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.rows.iter().find(|r| r.id == *id).cloned())
    }
}

fn db(id: u32, name: &str, status: &str) -> Db {
    Db {
        id,
        name: name.to_string(),
        status: status.to_string(),
    }
}

fn engine() -> ListEngine {
    ListEngine::builder("databases")
        .field("id", FieldKind::I64)
        .field("name", FieldKind::String)
        .field("status", FieldKind::String)
        .build()
}

fn raw(pairs: &[(&str, &str)]) -> RawListParams {
    RawListParams::from_pairs(pairs.iter().copied())
}

#[tokio::test]
async fn filters_by_status() {
    let source = MemSource::new(vec![
        db(1, "orders", "ONLINE"),
        db(2, "billing", "OFFLINE"),
        db(3, "users", "ONLINE"),
    ]);
    let out = engine()
        .list(
            &raw(&[("filter", "status||EQ||ONLINE")]),
            &source,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(out.meta.item_count, 2);
    assert!(out.data.iter().all(|d| d.status == "ONLINE"));
    assert_eq!(source.calls.count.load(Ordering::SeqCst), 1);
    assert_eq!(source.calls.find.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_page_of_25() {
    let rows = (1..=25).map(|i| db(i, &format!("db{i:02}"), "ONLINE")).collect();
    let source = MemSource::new(rows);
    let out = engine()
        .list(
            &raw(&[("page", "2"), ("size", "10")]),
            &source,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(out.data.len(), 10);
    assert_eq!(out.data[0].id, 11);
    assert_eq!(out.meta.page, 2);
    assert_eq!(out.meta.take, 10);
    assert_eq!(out.meta.item_count, 25);
    assert_eq!(out.meta.page_count, 3);
    assert!(out.meta.has_previous_page);
    assert!(out.meta.has_next_page);
}

#[tokio::test]
async fn sort_is_applied_in_order() {
    let source = MemSource::new(vec![
        db(1, "b", "ONLINE"),
        db(2, "a", "ONLINE"),
        db(3, "c", "ONLINE"),
    ]);
    let out = engine()
        .list(
            &raw(&[("sort", "name:desc")]),
            &source,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let names: Vec<_> = out.data.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn page_past_the_end_skips_find() {
    let source = MemSource::new(vec![db(1, "a", "ONLINE")]);
    let out = engine()
        .list(&raw(&[("page", "5")]), &source, &CancellationToken::new())
        .await
        .unwrap();

    assert!(out.data.is_empty());
    assert_eq!(out.meta.item_count, 1);
    assert!(!out.meta.has_next_page);
    assert_eq!(source.calls.find.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_input_never_reaches_the_source() {
    let source = MemSource::new(vec![db(1, "a", "ONLINE")]);
    let cases: &[&[(&str, &str)]] = &[
        &[("filter", "password||EQ||x")],
        &[("filter", "status||LIKE||x")],
        &[("filter", "status||BETWEEN||a")],
        &[("filter", "id||GT||many")],
        &[("sort", "password:desc")],
        &[("filter", "status||EQ||ONLINE"), ("sort", "nope")],
    ];

    for case in cases {
        let err = engine()
            .list(&raw(case), &source, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::Validation(_)), "{case:?}: {err}");
        assert!(err.is_client_error());
    }
    assert_eq!(source.calls.total(), 0);
}

#[tokio::test]
async fn hand_built_mismatched_clause_never_reaches_the_source() {
    let source = MemSource::new(vec![db(1, "a", "ONLINE")]);
    let bad = FilterClause {
        field: "status".into(),
        op: FilterOp::Eq,
        value: FilterValue::List(vec![Value::String("ONLINE".into())]),
    };

    let err = execute_list(
        &PageRequest::default(),
        &[],
        &[bad],
        &source,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ListError::Validation(_)), "{err}");
    assert_eq!(source.calls.total(), 0);
}

#[tokio::test]
async fn source_failure_is_opaque() {
    let source = MemSource::new(vec![]).with_mode(Mode::Fail);
    let err = engine()
        .list(&RawListParams::default(), &source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ListError::Processing));
    assert!(!err.to_string().contains("10.0.0.5"));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn cancellation_abandons_the_call() {
    let source = MemSource::new(vec![]).with_mode(Mode::Hang);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        execute_list(&PageRequest::default(), &[], &[], &source, &cancel),
    )
    .await
    .expect("executor must return once cancelled")
    .unwrap_err();

    assert!(matches!(err, ListError::Cancelled));
    assert_eq!(source.calls.find.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn already_cancelled_token_short_circuits() {
    let source = MemSource::new(vec![db(1, "a", "ONLINE")]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = execute_get_by_id(&1, &source, &cancel).await.unwrap_err();
    assert!(matches!(err, ListError::Cancelled));
}

#[tokio::test]
async fn get_by_id_found_and_missing() {
    let source = MemSource::new(vec![db(7, "orders", "ONLINE")]);
    let cancel = CancellationToken::new();

    let found = engine().get(&7, &source, &cancel).await.unwrap();
    assert_eq!(found.name, "orders");

    let err = engine().get(&8, &source, &cancel).await.unwrap_err();
    match err {
        ListError::NotFound { id } => assert_eq!(id, "8"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn size_is_capped_by_engine_config() {
    let rows = (1..=30).map(|i| db(i, "x", "ONLINE")).collect();
    let source = MemSource::new(rows);
    let engine = ListEngine::builder("databases")
        .field("status", FieldKind::String)
        .page_cfg(PageCfg {
            default_size: 5,
            max_size: 20,
        })
        .build();

    let out = engine
        .list(&raw(&[("size", "1000")]), &source, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out.data.len(), 20);
    assert_eq!(out.meta.take, 20);

    let out = engine
        .list(&RawListParams::default(), &source, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out.meta.take, 5);
}
