//! `SeaORM` Entity for balance_adjustments table.
//!
//! Audit trail of manual balance corrections. The one place a balance
//! changes without a transaction row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "balance_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub account_id: Uuid,
    /// User who made the correction.
    pub actor_user_id: Uuid,
    /// Signed delta in minor units, never zero.
    pub delta: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub reason: Option<String>,
    /// Milliseconds since epoch.
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
