//! Document entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Client-supplied filename, the upsert key
    #[sea_orm(unique)]
    pub filename: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Entity surface forms joined with ", "
    #[sea_orm(column_type = "Text", nullable)]
    pub entities: Option<String>,

    #[sea_orm(indexed, nullable)]
    pub category: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
