//! `SeaORM` entity definitions.

pub mod accounts;
pub mod balance_adjustments;
pub mod categories;
pub mod ledgers;
pub mod sea_orm_active_enums;
pub mod transactions;
