//! Ledger domain: transaction kinds, account effects, and rebalancing.

pub mod effects;
pub mod error;
pub mod types;

pub use effects::{AccountEffect, DeltaMap, rebalance, transaction_effects};
pub use error::LedgerError;
pub use types::{AccountKind, CategoryKind, EntityStatus, TransactionKind};
