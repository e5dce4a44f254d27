use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use query_core::ast::Predicate;
use query_core::{ListSource, OrderSpec, SortDir};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QuerySelect,
};

use crate::condition::{FieldMap, OrderSpecExt, PredicateExt};

/// API name of the key appended to every ordering.
const TIEBREAKER: &str = "id";

/// [`ListSource`] over one sea-orm entity.
///
/// Every ordering gets `id` (ascending) appended, so an empty ordering means
/// primary-key order and offset pages never overlap.
pub struct SeaOrmSource<E: EntityTrait> {
    conn: DatabaseConnection,
    fields: Arc<FieldMap<E>>,
}

impl<E: EntityTrait> Clone for SeaOrmSource<E> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            fields: Arc::clone(&self.fields),
        }
    }
}

impl<E: EntityTrait> SeaOrmSource<E> {
    pub fn new(conn: DatabaseConnection, fields: impl Into<Arc<FieldMap<E>>>) -> Self {
        Self {
            conn,
            fields: fields.into(),
        }
    }

    pub fn fields(&self) -> &FieldMap<E> {
        &self.fields
    }
}

#[async_trait]
impl<E> ListSource for SeaOrmSource<E>
where
    E: EntityTrait,
    E::Model: Sync,
    E::Column: ColumnTrait + Copy,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: fmt::Display + Clone + Sync,
{
    type Item = E::Model;
    type Id = <E::PrimaryKey as PrimaryKeyTrait>::ValueType;

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        let select = E::find().apply_predicate(predicate, &self.fields)?;
        select
            .count(&self.conn)
            .await
            .with_context(|| format!("count on {}", E::default().table_name()))
    }

    async fn find(
        &self,
        predicate: &Predicate,
        order: &OrderSpec,
        skip: u64,
        take: u64,
    ) -> anyhow::Result<Vec<E::Model>> {
        let order = order
            .clone()
            .ensure_tiebreaker(TIEBREAKER, SortDir::Asc);
        tracing::trace!(order = %order.to_signed_tokens(), skip, take, "select page");

        let select = E::find()
            .apply_predicate(predicate, &self.fields)?
            .apply_order(&order, &self.fields)?
            .offset(skip)
            .limit(take);
        select
            .all(&self.conn)
            .await
            .with_context(|| format!("select on {}", E::default().table_name()))
    }

    async fn find_by_id(&self, id: &Self::Id) -> anyhow::Result<Option<E::Model>> {
        E::find_by_id(id.clone())
            .one(&self.conn)
            .await
            .with_context(|| format!("select by id on {}", E::default().table_name()))
    }
}
