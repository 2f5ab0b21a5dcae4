use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "keywords")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub keyword: String,
    pub first_created_time: String,
    pub last_used_time: Option<String>,
    pub source: Option<String>,
    pub trend_percentage: Option<f64>,
    pub last_updated: Option<String>,
    /// Free-text classification tag, only set through batch use-marking.
    #[sea_orm(column_name = "type")]
    pub kind: Option<String>,
    pub ignore: bool,
    pub ignore_time: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
