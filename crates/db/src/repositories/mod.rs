//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every mutation that touches a balance runs inside a
//! database transaction and locks the affected account rows.

pub mod account;
pub mod category;
pub mod ledger;
pub mod report;
pub mod transaction;

pub use account::{
    AccountError, AccountRepository, CreateAccountInput, UpdateAccountInput,
};
pub use category::{CategoryError, CategoryRepository, UpdateCategoryInput};
pub use ledger::{LedgerError, LedgerRepository};
pub use report::{CategoryBreakdownRow, ReportError, ReportRepository};
pub use transaction::{
    TransactionError, TransactionFilter, TransactionPatch, TransactionRepository,
};

/// Current wall-clock time in milliseconds since epoch.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
