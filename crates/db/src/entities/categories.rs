//! `SeaORM` Entity for categories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CategoryKind, EntityStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub status: EntityStatus,
    /// Seeded default categories carry this flag.
    pub is_system: bool,
    /// Milliseconds since epoch.
    pub created_at: i64,
    /// Milliseconds since epoch.
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id"
    )]
    Ledgers,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
