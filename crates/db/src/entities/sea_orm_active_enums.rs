//! Postgres enum mappings.
//!
//! Each enum here mirrors a domain enum in `cashbook-core`; the `From`
//! impls keep repositories free of string matching.

use cashbook_core::ledger as domain;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction kind enum (`transaction_kind`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money leaving an account.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Money entering an account.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money moving between two accounts.
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

impl From<domain::TransactionKind> for TransactionKind {
    fn from(kind: domain::TransactionKind) -> Self {
        match kind {
            domain::TransactionKind::Expense => Self::Expense,
            domain::TransactionKind::Income => Self::Income,
            domain::TransactionKind::Transfer => Self::Transfer,
        }
    }
}

impl From<TransactionKind> for domain::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Expense => Self::Expense,
            TransactionKind::Income => Self::Income,
            TransactionKind::Transfer => Self::Transfer,
        }
    }
}

/// Account kind enum (`account_kind`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_kind")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Physical cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank or savings account.
    #[sea_orm(string_value = "bank")]
    Bank,
    /// Credit card.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Third-party wallet.
    #[sea_orm(string_value = "wallet")]
    Wallet,
}

impl From<domain::AccountKind> for AccountKind {
    fn from(kind: domain::AccountKind) -> Self {
        match kind {
            domain::AccountKind::Cash => Self::Cash,
            domain::AccountKind::Bank => Self::Bank,
            domain::AccountKind::Credit => Self::Credit,
            domain::AccountKind::Wallet => Self::Wallet,
        }
    }
}

impl From<AccountKind> for domain::AccountKind {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Cash => Self::Cash,
            AccountKind::Bank => Self::Bank,
            AccountKind::Credit => Self::Credit,
            AccountKind::Wallet => Self::Wallet,
        }
    }
}

/// Category kind enum (`category_kind`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "category_kind")]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Category for expense transactions.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Category for income transactions.
    #[sea_orm(string_value = "income")]
    Income,
}

impl From<domain::CategoryKind> for CategoryKind {
    fn from(kind: domain::CategoryKind) -> Self {
        match kind {
            domain::CategoryKind::Expense => Self::Expense,
            domain::CategoryKind::Income => Self::Income,
        }
    }
}

impl From<CategoryKind> for domain::CategoryKind {
    fn from(kind: CategoryKind) -> Self {
        match kind {
            CategoryKind::Expense => Self::Expense,
            CategoryKind::Income => Self::Income,
        }
    }
}

/// Entity status enum (`entity_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entity_status")]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    /// Usable in new transactions.
    #[sea_orm(string_value = "active")]
    Active,
    /// Hidden from pickers, rejected by new transactions.
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl EntityStatus {
    /// Returns true for `Active`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<domain::EntityStatus> for EntityStatus {
    fn from(status: domain::EntityStatus) -> Self {
        match status {
            domain::EntityStatus::Active => Self::Active,
            domain::EntityStatus::Inactive => Self::Inactive,
        }
    }
}

impl From<EntityStatus> for domain::EntityStatus {
    fn from(status: EntityStatus) -> Self {
        match status {
            EntityStatus::Active => Self::Active,
            EntityStatus::Inactive => Self::Inactive,
        }
    }
}
