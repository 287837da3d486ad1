//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccountKind, EntityStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub status: EntityStatus,
    /// Opening balance in minor units. Immutable after creation.
    pub initial_balance: i64,
    /// Live balance in minor units. Mutated by every transaction and
    /// adjustment touching this account.
    pub current_balance: i64,
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
    #[sea_orm(has_many = "super::balance_adjustments::Entity")]
    BalanceAdjustments,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl Related<super::balance_adjustments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceAdjustments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
