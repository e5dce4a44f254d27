use anyhow::Context;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::debug;

use super::entity::{
    audit_events, databases, index_metrics, query_metrics, recommendations, table_metrics,
};

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = conn.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();

    conn.execute(backend.build(&stmt))
        .await
        .with_context(|| format!("create table {}", entity.table_name()))?;
    debug!(table = entity.table_name(), "table ready");
    Ok(())
}

/// Create every report table that does not exist yet. Existing tables are
/// left untouched; there is no migration history.
pub async fn create_tables(conn: &DatabaseConnection) -> anyhow::Result<()> {
    create_table(conn, databases::Entity).await?;
    create_table(conn, query_metrics::Entity).await?;
    create_table(conn, index_metrics::Entity).await?;
    create_table(conn, table_metrics::Entity).await?;
    create_table(conn, recommendations::Entity).await?;
    create_table(conn, audit_events::Entity).await?;
    Ok(())
}
