//! Report repository: read-only aggregation endpoints.
//!
//! Fetches transaction rows and delegates the arithmetic to
//! `cashbook_core::reports`. Balance adjustments are never included;
//! they affect balances, not spending history.

use cashbook_core::ledger::CategoryKind;
use cashbook_core::reports::{
    self, CategoryBucket, Granularity, MonthlySummary, ReportEntry, TrendPoint,
};
use cashbook_core::validation::{self, ValidationError};
use cashbook_shared::AppError;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{categories, sea_orm_active_enums, transactions};

/// Error types for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Validation(e) => e.into(),
            ReportError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// One category's share of a breakdown, with its display name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdownRow {
    /// Category id, absent for uncategorized rows.
    pub category_id: Option<Uuid>,
    /// Display name, `"Uncategorized"` when no category.
    pub name: String,
    /// Total amount in minor units.
    pub amount: i64,
    /// Number of transactions.
    pub count: u64,
    /// Share of the total in basis points.
    pub ratio_bps: i64,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Income, expense, transfer, and net totals for one calendar month.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid year or month, or a failed query.
    pub async fn monthly_summary(
        &self,
        ledger_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary, ReportError> {
        let (from, to) = reports::month_range(year, month)?;
        let entries = self.fetch_entries(ledger_id, from, to, None).await?;
        Ok(reports::monthly_summary(year, month, &entries))
    }

    /// Per-category totals for one kind in one calendar month, largest
    /// first, with display names resolved.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid year or month, or a failed query.
    pub async fn category_breakdown(
        &self,
        ledger_id: Uuid,
        year: i32,
        month: u32,
        kind: CategoryKind,
    ) -> Result<Vec<CategoryBreakdownRow>, ReportError> {
        let (from, to) = reports::month_range(year, month)?;
        let entries = self
            .fetch_entries(ledger_id, from, to, Some(kind.transaction_kind()))
            .await?;
        let buckets = reports::category_breakdown(&entries);
        self.resolve_names(buckets).await
    }

    /// Income/expense/net points over a time range, bucketed by day or
    /// month. Transfers are excluded.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid time range or a failed query.
    pub async fn trend(
        &self,
        ledger_id: Uuid,
        from: Option<i64>,
        to: Option<i64>,
        granularity: Granularity,
    ) -> Result<Vec<TrendPoint>, ReportError> {
        let (from, to) = validation::time_range(from, to)?;
        let entries = self.fetch_entries(ledger_id, from, to, None).await?;
        Ok(reports::trend(&entries, granularity))
    }

    async fn fetch_entries(
        &self,
        ledger_id: Uuid,
        from: i64,
        to: i64,
        kind: Option<cashbook_core::ledger::TransactionKind>,
    ) -> Result<Vec<ReportEntry>, ReportError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::LedgerId.eq(ledger_id))
            .filter(transactions::Column::OccurredAt.gte(from))
            .filter(transactions::Column::OccurredAt.lte(to));

        if let Some(kind) = kind {
            let kind: sea_orm_active_enums::TransactionKind = kind.into();
            query = query.filter(transactions::Column::Kind.eq(kind));
        }

        let rows = query.all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|row| ReportEntry {
                kind: row.kind.into(),
                amount: row.amount,
                category_id: row.category_id,
                occurred_at: row.occurred_at,
            })
            .collect())
    }

    async fn resolve_names(
        &self,
        buckets: Vec<CategoryBucket>,
    ) -> Result<Vec<CategoryBreakdownRow>, ReportError> {
        let ids: Vec<Uuid> = buckets.iter().filter_map(|b| b.category_id).collect();
        let names: std::collections::HashMap<Uuid, String> = if ids.is_empty() {
            std::collections::HashMap::new()
        } else {
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        Ok(buckets
            .into_iter()
            .map(|bucket| {
                let name = bucket
                    .category_id
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| "Uncategorized".to_string());
                CategoryBreakdownRow {
                    category_id: bucket.category_id,
                    name,
                    amount: bucket.amount,
                    count: bucket.count,
                    ratio_bps: bucket.ratio_bps,
                }
            })
            .collect())
    }
}
