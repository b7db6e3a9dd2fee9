//! `SeaORM` Entity for the host ad_session table (read-only)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ad_session_id: String,
    pub username: Option<String>,
    pub created: DateTime,
    pub createdby: Option<String>,
    pub updated: Option<DateTime>,
    pub updatedby: Option<String>,
    /// 'Y' while the session is open
    pub session_active: String,
    /// S, F, L, OBPOS_POS, ...
    pub login_status: Option<String>,
    pub server_url: Option<String>,
    pub remote_addr: Option<String>,
    pub last_session_ping: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
