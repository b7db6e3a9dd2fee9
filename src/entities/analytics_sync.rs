//! `SeaORM` Entity for analytics_sync table
//!
//! Append-only history of sync attempts. Rows are inserted once per
//! attempt and never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "analytics_sync")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Feed type wire name (SESSION_USAGE_AUDITS, MODULE_METADATA)
    pub sync_type: String,
    /// Instant the attempt completed
    pub last_sync: Option<DateTimeWithTimeZone>,
    /// SUCCESS or FAILED
    pub last_status: String,
    /// Job ID, record counts and message in the textual log format
    #[sea_orm(column_type = "Text", nullable)]
    pub log: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
