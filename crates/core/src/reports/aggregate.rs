//! Aggregation functions behind the report endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use uuid::Uuid;

use crate::ledger::TransactionKind;
use crate::validation::ValidationError;

use super::types::{CategoryBucket, Granularity, MonthlySummary, ReportEntry, TrendPoint};

/// Returns the inclusive millisecond range `[start, end]` of a calendar
/// month in UTC.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTimestamp` for a year outside
/// 1970..=9999 or a month outside 1..=12.
pub fn month_range(year: i32, month: u32) -> Result<(i64, i64), ValidationError> {
    if !(1970..=9999).contains(&year) {
        return Err(ValidationError::InvalidTimestamp { field: "year" });
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidTimestamp { field: "month" });
    }

    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or(ValidationError::InvalidTimestamp { field: "month" })?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or(ValidationError::InvalidTimestamp { field: "month" })?;

    Ok((start.timestamp_millis(), next.timestamp_millis() - 1))
}

/// Formats the bucket label for a timestamp at the given granularity.
#[must_use]
pub fn bucket_key(occurred_at: i64, granularity: Granularity) -> String {
    let when: DateTime<Utc> = Utc
        .timestamp_millis_opt(occurred_at)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH);
    match granularity {
        Granularity::Day => format!("{:04}-{:02}-{:02}", when.year(), when.month(), when.day()),
        Granularity::Month => format!("{:04}-{:02}", when.year(), when.month()),
    }
}

/// Totals up one month of transactions.
#[must_use]
pub fn monthly_summary(year: i32, month: u32, entries: &[ReportEntry]) -> MonthlySummary {
    let mut summary = MonthlySummary {
        year,
        month,
        income: 0,
        expense: 0,
        transfer: 0,
        net: 0,
        transaction_count: 0,
    };
    for entry in entries {
        match entry.kind {
            TransactionKind::Income => summary.income += entry.amount,
            TransactionKind::Expense => summary.expense += entry.amount,
            TransactionKind::Transfer => summary.transfer += entry.amount,
        }
        summary.transaction_count += 1;
    }
    summary.net = summary.income - summary.expense;
    summary
}

/// Groups entries of a single kind by category.
///
/// Buckets come back sorted by amount descending, then by category id for
/// a stable order between equal amounts. `ratio_bps` is each bucket's
/// share of the grand total in basis points; with a zero total every
/// ratio is zero.
#[must_use]
pub fn category_breakdown(entries: &[ReportEntry]) -> Vec<CategoryBucket> {
    let mut totals: BTreeMap<Option<Uuid>, (i64, u64)> = BTreeMap::new();
    for entry in entries {
        let slot = totals.entry(entry.category_id).or_insert((0, 0));
        slot.0 += entry.amount;
        slot.1 += 1;
    }

    let grand_total: i64 = totals.values().map(|&(amount, _)| amount).sum();

    let mut buckets: Vec<CategoryBucket> = totals
        .into_iter()
        .map(|(category_id, (amount, count))| CategoryBucket {
            category_id,
            amount,
            count,
            ratio_bps: ratio_bps(amount, grand_total),
        })
        .collect();
    buckets.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category_id.cmp(&b.category_id)));
    buckets
}

fn ratio_bps(amount: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    let scaled = i128::from(amount) * 10_000 / i128::from(total);
    i64::try_from(scaled).unwrap_or(0)
}

/// Buckets entries by day or month and nets income against expense.
///
/// Transfers are excluded: money moving between own accounts is neither
/// earned nor spent. Points come back sorted by bucket label, which for
/// `YYYY-MM`/`YYYY-MM-DD` labels is chronological order.
#[must_use]
pub fn trend(entries: &[ReportEntry], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for entry in entries {
        let (income, expense) = match entry.kind {
            TransactionKind::Income => (entry.amount, 0),
            TransactionKind::Expense => (0, entry.amount),
            TransactionKind::Transfer => continue,
        };
        let slot = buckets
            .entry(bucket_key(entry.occurred_at, granularity))
            .or_insert((0, 0));
        slot.0 += income;
        slot.1 += expense;
    }

    buckets
        .into_iter()
        .map(|(bucket, (income, expense))| TrendPoint {
            bucket,
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: TransactionKind, amount: i64, occurred_at: i64) -> ReportEntry {
        ReportEntry {
            kind,
            amount,
            category_id: None,
            occurred_at,
        }
    }

    fn entry_in(kind: TransactionKind, amount: i64, category: u128) -> ReportEntry {
        ReportEntry {
            kind,
            amount,
            category_id: Some(Uuid::from_u128(category)),
            occurred_at: 1_704_067_200_000, // 2024-01-01T00:00:00Z
        }
    }

    #[test]
    fn test_month_range_january_2024() {
        let (start, end) = month_range(2024, 1).expect("range");
        assert_eq!(start, 1_704_067_200_000);
        // One millisecond before 2024-02-01T00:00:00Z.
        assert_eq!(end, 1_706_745_600_000 - 1);
    }

    #[test]
    fn test_month_range_december_rolls_year() {
        let (start, end) = month_range(2023, 12).expect("range");
        assert!(start < end);
        let (jan_start, _) = month_range(2024, 1).expect("range");
        assert_eq!(end, jan_start - 1);
    }

    #[test]
    fn test_month_range_rejects_bad_inputs() {
        assert!(month_range(2024, 0).is_err());
        assert!(month_range(2024, 13).is_err());
        assert!(month_range(1969, 6).is_err());
        assert!(month_range(10_000, 6).is_err());
    }

    #[test]
    fn test_bucket_key_formats() {
        let ts = 1_704_067_200_000; // 2024-01-01T00:00:00Z
        assert_eq!(bucket_key(ts, Granularity::Day), "2024-01-01");
        assert_eq!(bucket_key(ts, Granularity::Month), "2024-01");
    }

    #[test]
    fn test_monthly_summary_nets_income_against_expense() {
        let entries = [
            entry(TransactionKind::Income, 500_000, 1),
            entry(TransactionKind::Expense, 120_000, 2),
            entry(TransactionKind::Expense, 30_000, 3),
            entry(TransactionKind::Transfer, 200_000, 4),
        ];
        let summary = monthly_summary(2024, 1, &entries);
        assert_eq!(summary.income, 500_000);
        assert_eq!(summary.expense, 150_000);
        assert_eq!(summary.transfer, 200_000);
        assert_eq!(summary.net, 350_000);
        assert_eq!(summary.transaction_count, 4);
    }

    #[test]
    fn test_monthly_summary_empty_month() {
        let summary = monthly_summary(2024, 2, &[]);
        assert_eq!(summary.net, 0);
        assert_eq!(summary.transaction_count, 0);
    }

    #[test]
    fn test_category_breakdown_sorts_and_ratios() {
        let entries = [
            entry_in(TransactionKind::Expense, 7_500, 1),
            entry_in(TransactionKind::Expense, 2_500, 2),
            entry_in(TransactionKind::Expense, 2_500, 2),
        ];
        let buckets = category_breakdown(&entries);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].category_id, Some(Uuid::from_u128(1)));
        assert_eq!(buckets[0].amount, 7_500);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].ratio_bps, 6_000);
        assert_eq!(buckets[1].amount, 5_000);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].ratio_bps, 4_000);
    }

    #[test]
    fn test_category_breakdown_groups_uncategorized() {
        let entries = [
            entry(TransactionKind::Expense, 100, 1),
            entry(TransactionKind::Expense, 200, 2),
        ];
        let buckets = category_breakdown(&entries);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].category_id, None);
        assert_eq!(buckets[0].amount, 300);
        assert_eq!(buckets[0].ratio_bps, 10_000);
    }

    #[test]
    fn test_category_breakdown_empty() {
        assert!(category_breakdown(&[]).is_empty());
    }

    #[test]
    fn test_trend_excludes_transfers_and_sorts() {
        let jan1 = 1_704_067_200_000;
        let jan2 = jan1 + 86_400_000;
        let entries = [
            entry(TransactionKind::Expense, 100, jan2),
            entry(TransactionKind::Income, 400, jan1),
            entry(TransactionKind::Transfer, 9_999, jan1),
            entry(TransactionKind::Expense, 50, jan1),
        ];
        let points = trend(&entries, Granularity::Day);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].bucket, "2024-01-01");
        assert_eq!(points[0].income, 400);
        assert_eq!(points[0].expense, 50);
        assert_eq!(points[0].net, 350);
        assert_eq!(points[1].bucket, "2024-01-02");
        assert_eq!(points[1].net, -100);
    }

    #[test]
    fn test_trend_month_granularity_merges_days() {
        let jan1 = 1_704_067_200_000;
        let jan20 = jan1 + 19 * 86_400_000;
        let entries = [
            entry(TransactionKind::Income, 100, jan1),
            entry(TransactionKind::Income, 100, jan20),
        ];
        let points = trend(&entries, Granularity::Month);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket, "2024-01");
        assert_eq!(points[0].income, 200);
    }
}
