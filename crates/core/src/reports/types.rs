//! Report input and output shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::TransactionKind;

/// The slice of a transaction that reports need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportEntry {
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Amount in minor currency units, always positive.
    pub amount: i64,
    /// Category, if any. Transfers never have one.
    pub category_id: Option<Uuid>,
    /// When the transaction occurred, milliseconds since epoch.
    pub occurred_at: i64,
}

/// Bucket granularity for trend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One point per calendar day.
    Day,
    /// One point per calendar month.
    Month,
}

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Total income.
    pub income: i64,
    /// Total expense.
    pub expense: i64,
    /// Total volume moved by transfers.
    pub transfer: i64,
    /// Income minus expense.
    pub net: i64,
    /// Number of transactions counted.
    pub transaction_count: u64,
}

/// One category's share of a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBucket {
    /// Category id, or `None` for uncategorized transactions.
    pub category_id: Option<Uuid>,
    /// Total amount in this category.
    pub amount: i64,
    /// Number of transactions in this category.
    pub count: u64,
    /// Share of the grand total, in basis points (0..=10000).
    pub ratio_bps: i64,
}

/// One point on a trend line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Bucket label: `YYYY-MM` or `YYYY-MM-DD` depending on granularity.
    pub bucket: String,
    /// Total income in the bucket.
    pub income: i64,
    /// Total expense in the bucket.
    pub expense: i64,
    /// Income minus expense in the bucket.
    pub net: i64,
}
