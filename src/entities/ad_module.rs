//! `SeaORM` Entity for the host ad_module table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_module")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_module_id: String,
    pub javapackage: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    /// M (module), P (pack), T (template)
    #[sea_orm(column_name = "type")]
    pub module_type: Option<String>,
    pub iscommercial: String,
    pub enabled: String,
    pub created: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
