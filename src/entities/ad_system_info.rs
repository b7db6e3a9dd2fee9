//! `SeaORM` Entity for the host ad_system_info table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_system_info")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_client_id: String,
    pub system_identifier: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
