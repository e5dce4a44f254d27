use sea_orm::entity::prelude::*;

/// Tuning advice produced by the analyzers (missing index, vacuum, ...).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recommendations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub database_id: Uuid,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub detail: Option<String>,
    pub estimated_gain_pct: f64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
