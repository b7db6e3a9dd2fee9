//! `SeaORM` Entity for the host ad_session_usage_audit table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_session_usage_audit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_session_usage_audit_id: String,
    pub ad_session_id: Option<String>,
    pub command: Option<String>,
    /// Tab id for window commands, process id for DEFAULT
    pub object_id: Option<String>,
    pub processtime: Option<Decimal>,
    pub created: DateTime,
    pub createdby: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ad_session::Entity",
        from = "Column::AdSessionId",
        to = "super::ad_session::Column::AdSessionId"
    )]
    AdSession,
}

impl Related<super::ad_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
