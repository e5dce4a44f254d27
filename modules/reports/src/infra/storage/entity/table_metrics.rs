use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "table_metrics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub database_id: Uuid,
    pub schema_name: String,
    pub relation_name: String,
    pub row_count: i64,
    pub dead_tuples: i64,
    /// Estimated wasted space as a fraction of the table size.
    pub bloat_ratio: Decimal,
    pub last_vacuum_at: Option<DateTimeUtc>,
    pub captured_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
