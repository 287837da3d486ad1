//! Pure aggregation over transaction rows.
//!
//! Adjustments never appear here: reports explain spending and earning,
//! and manual balance corrections are neither.

pub mod aggregate;
pub mod types;

pub use aggregate::{bucket_key, category_breakdown, monthly_summary, month_range, trend};
pub use types::{CategoryBucket, Granularity, MonthlySummary, ReportEntry, TrendPoint};
