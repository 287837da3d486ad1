//! Domain enums shared across the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a transaction. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money leaving an account.
    Expense,
    /// Money entering an account.
    Income,
    /// Money moving between two accounts of the same ledger.
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Income => write!(f, "income"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Kind of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Physical cash.
    Cash,
    /// Bank or savings account.
    Bank,
    /// Credit card.
    Credit,
    /// Third-party wallet.
    Wallet,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Bank => write!(f, "bank"),
            Self::Credit => write!(f, "credit"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "credit" => Ok(Self::Credit),
            "wallet" => Ok(Self::Wallet),
            other => Err(format!("unknown account kind: {other}")),
        }
    }
}

/// Kind of a category. Categories apply to expenses or incomes, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Category for expense transactions.
    Expense,
    /// Category for income transactions.
    Income,
}

impl CategoryKind {
    /// Returns the transaction kind this category applies to.
    #[must_use]
    pub const fn transaction_kind(self) -> TransactionKind {
        match self {
            Self::Expense => TransactionKind::Expense,
            Self::Income => TransactionKind::Income,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Income => write!(f, "income"),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(format!("unknown category kind: {other}")),
        }
    }
}

/// Soft-delete status of accounts and categories.
///
/// Inactive entities stay referenced by historical transactions but
/// cannot take part in new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    /// Usable in new transactions.
    Active,
    /// Hidden from pickers, rejected by new transactions.
    Inactive,
}

impl EntityStatus {
    /// Returns true for `Active`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for EntityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown status: {other}")),
        }
    }
}
