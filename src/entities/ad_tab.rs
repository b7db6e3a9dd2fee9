//! `SeaORM` Entity for the host ad_tab table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_tab")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_tab_id: String,
    pub ad_window_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
