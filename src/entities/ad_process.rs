//! `SeaORM` Entity for the host ad_process table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_process")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_process_id: String,
    pub name: Option<String>,
    pub ad_module_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
