//! Core business logic for Cashbook.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and the balance
//! arithmetic live here.
//!
//! # Modules
//!
//! - `ledger` - Transaction kinds, account effects, and the rebalance algorithm
//! - `validation` - Input validation primitives shared by all mutations
//! - `reports` - Pure aggregation over transactions (summaries, trends)

pub mod ledger;
pub mod reports;
pub mod validation;
