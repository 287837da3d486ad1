//! Transaction repository: the balance-consistent mutation engine.
//!
//! Every create/update/delete runs inside a database transaction that
//! locks the touched account rows (`SELECT ... FOR UPDATE`) before
//! reading balances, so concurrent mutations against the same account
//! serialize instead of racing. Account rows are always locked in
//! ascending id order, which rules out lock-order deadlocks between
//! concurrent mutations.

use std::collections::{BTreeSet, HashMap};

use cashbook_core::ledger::{
    self as domain, AccountEffect, LedgerError as DomainError, rebalance, transaction_effects,
};
use cashbook_core::validation::{self, ValidationError};
use cashbook_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{accounts, categories, sea_orm_active_enums, transactions};

use super::now_millis;

/// Default and maximum page size for transaction listings.
const LISTING_DEFAULT_LIMIT: u64 = 100;
const LISTING_MAX_LIMIT: u64 = 500;

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// A patched field does not apply to this transaction kind.
    #[error("{field} does not apply to this transaction kind")]
    FieldNotApplicable {
        /// The offending field.
        field: &'static str,
    },

    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Business-rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_)
            | TransactionError::AccountNotFound(_)
            | TransactionError::CategoryNotFound(_) => Self::NotFound(err.to_string()),
            TransactionError::FieldNotApplicable { .. } => {
                Self::InvalidArgument(err.to_string())
            }
            TransactionError::Validation(e) => e.into(),
            TransactionError::Domain(e) => e.into(),
            TransactionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by kind.
    pub kind: Option<domain::TransactionKind>,
    /// Matches transactions where the account is source or destination.
    pub account_id: Option<Uuid>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Inclusive lower bound on `occurred_at`, milliseconds.
    pub from: Option<i64>,
    /// Inclusive upper bound on `occurred_at`, milliseconds.
    pub to: Option<i64>,
    /// Case-insensitive substring match on the note.
    pub note_contains: Option<String>,
    /// Inclusive lower bound on the amount.
    pub min_amount: Option<i64>,
    /// Inclusive upper bound on the amount.
    pub max_amount: Option<i64>,
    /// Result cap, 1 through 500, default 100.
    pub limit: Option<u64>,
}

/// Partial patch for a transaction. The kind is immutable; everything
/// else mutable for the kind may be patched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    /// New amount, minor units.
    pub amount: Option<i64>,
    /// New occurrence time, milliseconds.
    pub occurred_at: Option<i64>,
    /// New account (source, for transfers).
    pub account_id: Option<Uuid>,
    /// New destination account. Transfers only.
    pub transfer_account_id: Option<Uuid>,
    /// New category. Expense/income only.
    pub category_id: Option<Uuid>,
    /// New note. Conflicts with `clear_note`.
    pub note: Option<String>,
    /// Removes the note. Conflicts with `note`.
    pub clear_note: bool,
}

/// Which SQL path a listing query takes. The residual filters (account
/// in either role, note substring, amount range) are always applied in
/// memory afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListingIndex {
    /// `(ledger_id, kind, occurred_at)`.
    KindTime,
    /// `(ledger_id, category_id, occurred_at)`.
    CategoryTime,
    /// `(ledger_id, occurred_at)` full scan.
    LedgerTime,
}

/// Picks the most selective index the filter can use.
pub(crate) const fn choose_listing_index(filter: &TransactionFilter) -> ListingIndex {
    if filter.kind.is_some() {
        ListingIndex::KindTime
    } else if filter.category_id.is_some() {
        ListingIndex::CategoryTime
    } else {
        ListingIndex::LedgerTime
    }
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense: inserts the row and atomically decrements the
    /// account balance.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid input, a missing or inactive account
    /// or category, or a cross-ledger reference.
    pub async fn create_expense(
        &self,
        ledger_id: Uuid,
        account_id: Uuid,
        category_id: Uuid,
        amount: i64,
        occurred_at: i64,
        note: Option<&str>,
    ) -> Result<transactions::Model, TransactionError> {
        self.create(
            ledger_id,
            domain::TransactionKind::Expense,
            account_id,
            None,
            Some(category_id),
            amount,
            occurred_at,
            note,
        )
        .await
    }

    /// Creates an income: inserts the row and atomically increments the
    /// account balance.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid input, a missing or inactive account
    /// or category, or a cross-ledger reference.
    pub async fn create_income(
        &self,
        ledger_id: Uuid,
        account_id: Uuid,
        category_id: Uuid,
        amount: i64,
        occurred_at: i64,
        note: Option<&str>,
    ) -> Result<transactions::Model, TransactionError> {
        self.create(
            ledger_id,
            domain::TransactionKind::Income,
            account_id,
            None,
            Some(category_id),
            amount,
            occurred_at,
            note,
        )
        .await
    }

    /// Creates a transfer: one row, source decremented and destination
    /// incremented by the same amount.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid input, identical source and
    /// destination, or a missing, inactive, or cross-ledger account.
    pub async fn create_transfer(
        &self,
        ledger_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: i64,
        occurred_at: i64,
        note: Option<&str>,
    ) -> Result<transactions::Model, TransactionError> {
        self.create(
            ledger_id,
            domain::TransactionKind::Transfer,
            from_account_id,
            Some(to_account_id),
            None,
            amount,
            occurred_at,
            note,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create(
        &self,
        ledger_id: Uuid,
        kind: domain::TransactionKind,
        account_id: Uuid,
        transfer_account_id: Option<Uuid>,
        category_id: Option<Uuid>,
        amount: i64,
        occurred_at: i64,
        note: Option<&str>,
    ) -> Result<transactions::Model, TransactionError> {
        validation::positive_amount(amount, "amount")?;
        validation::timestamp_millis(occurred_at, "occurred_at")?;
        let note = validation::optional_note(note);

        let effects = transaction_effects(kind, amount, account_id, transfer_account_id)?;

        let txn = self.db.begin().await?;

        let locked = lock_accounts(&txn, ledger_id, effect_account_ids(&effects)).await?;
        for account in locked.values() {
            if !account.status.is_active() {
                return Err(DomainError::AccountInactive(account.id).into());
            }
        }
        if let Some(category_id) = category_id {
            assert_usable_category(&txn, ledger_id, category_id, kind).await?;
        }

        apply_effects(&txn, &locked, &effects).await?;

        let now = now_millis();
        let row = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            ledger_id: Set(ledger_id),
            kind: Set(kind.into()),
            amount: Set(amount),
            account_id: Set(account_id),
            transfer_account_id: Set(transfer_account_id),
            category_id: Set(category_id),
            note: Set(note),
            occurred_at: Set(occurred_at),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(transaction_id = %row.id, kind = %kind, amount = amount, "transaction created");
        Ok(row)
    }

    /// Edits a transaction in place with a delta-based rebalance: the
    /// net difference between the old and new balance effects is applied
    /// to every touched account, one patch per account, with the full
    /// set of involved rows locked up front.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid input, a field that does not apply to
    /// the transaction's kind, or a missing, inactive, or cross-ledger
    /// reference.
    pub async fn update(
        &self,
        ledger_id: Uuid,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> Result<transactions::Model, TransactionError> {
        if patch.note.is_some() && patch.clear_note {
            return Err(ValidationError::NoteConflict.into());
        }
        let note = match &patch.note {
            Some(note) => Some(validation::required_name(note, "note")?),
            None => None,
        };
        if let Some(amount) = patch.amount {
            validation::positive_amount(amount, "amount")?;
        }
        if let Some(occurred_at) = patch.occurred_at {
            validation::timestamp_millis(occurred_at, "occurred_at")?;
        }

        let txn = self.db.begin().await?;

        let existing = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::LedgerId.eq(ledger_id))
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;
        let kind: domain::TransactionKind = existing.kind.clone().into();

        if kind != domain::TransactionKind::Transfer && patch.transfer_account_id.is_some() {
            return Err(TransactionError::FieldNotApplicable {
                field: "transfer_account_id",
            });
        }
        if kind == domain::TransactionKind::Transfer && patch.category_id.is_some() {
            return Err(DomainError::TransferCannotHaveCategory.into());
        }

        let old_effects = transaction_effects(
            kind,
            existing.amount,
            existing.account_id,
            existing.transfer_account_id,
        )?;

        let new_amount = patch.amount.unwrap_or(existing.amount);
        let new_account_id = patch.account_id.unwrap_or(existing.account_id);
        let new_transfer_account_id =
            patch.transfer_account_id.or(existing.transfer_account_id);
        let new_effects =
            transaction_effects(kind, new_amount, new_account_id, new_transfer_account_id)?;

        // Lock every involved account, old roles and new, in id order.
        let mut involved = effect_account_ids(&old_effects);
        involved.extend(effect_account_ids(&new_effects));
        let locked = lock_accounts(&txn, ledger_id, involved).await?;

        // Accounts the edit newly introduces must be usable; accounts
        // only being refunded may be inactive.
        let old_ids: BTreeSet<Uuid> = effect_account_ids(&old_effects);
        for effect in &new_effects {
            if !old_ids.contains(&effect.account_id) {
                let account = &locked[&effect.account_id];
                if !account.status.is_active() {
                    return Err(DomainError::AccountInactive(account.id).into());
                }
            }
        }

        if let Some(category_id) = patch.category_id {
            assert_usable_category(&txn, ledger_id, category_id, kind).await?;
        }

        apply_effects(&txn, &locked, &rebalance(&old_effects, &new_effects)).await?;

        let mut active: transactions::ActiveModel = existing.into();
        active.amount = Set(new_amount);
        active.account_id = Set(new_account_id);
        active.transfer_account_id = Set(new_transfer_account_id);
        if let Some(occurred_at) = patch.occurred_at {
            active.occurred_at = Set(occurred_at);
        }
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(note) = note {
            active.note = Set(Some(note));
        } else if patch.clear_note {
            active.note = Set(None);
        }
        active.updated_at = Set(now_millis());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(transaction_id = %updated.id, "transaction updated");
        Ok(updated)
    }

    /// Deletes a transaction, reversing its balance effects exactly.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist in the
    /// ledger.
    pub async fn remove(
        &self,
        ledger_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Uuid, TransactionError> {
        let txn = self.db.begin().await?;

        let existing = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::LedgerId.eq(ledger_id))
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;

        let effects = transaction_effects(
            existing.kind.clone().into(),
            existing.amount,
            existing.account_id,
            existing.transfer_account_id,
        )?;
        let reversal = rebalance(&effects, &[]);

        let locked = lock_accounts(&txn, ledger_id, effect_account_ids(&effects)).await?;
        apply_effects(&txn, &locked, &reversal).await?;

        transactions::Entity::delete_by_id(transaction_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(transaction_id = %transaction_id, "transaction deleted");
        Ok(transaction_id)
    }

    /// Lists transactions newest first.
    ///
    /// Kind, category, and time bounds go to SQL against the most
    /// selective index; account (either role), note substring, and
    /// amount range are post-filtered in memory; the limit applies to
    /// the filtered result.
    ///
    /// # Errors
    ///
    /// Returns an error on an out-of-bounds limit, an inverted time
    /// range, or a failed query.
    pub async fn list(
        &self,
        ledger_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<transactions::Model>, TransactionError> {
        let limit =
            validation::bounded_limit(filter.limit, LISTING_DEFAULT_LIMIT, LISTING_MAX_LIMIT)?;
        let (from, to) = validation::time_range(filter.from, filter.to)?;
        let needs_post_filter = filter.account_id.is_some()
            || filter.note_contains.is_some()
            || filter.min_amount.is_some()
            || filter.max_amount.is_some();

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::LedgerId.eq(ledger_id))
            .filter(transactions::Column::OccurredAt.gte(from))
            .filter(transactions::Column::OccurredAt.lte(to));

        if let Some(kind) = filter.kind {
            let kind: sea_orm_active_enums::TransactionKind = kind.into();
            query = query.filter(transactions::Column::Kind.eq(kind));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }

        query = query
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt);
        if !needs_post_filter {
            query = query.limit(limit);
        }

        tracing::debug!(index = ?choose_listing_index(&filter), "listing transactions");
        let rows = query.all(&self.db).await?;

        let note_needle = filter.note_contains.as_deref().map(str::to_lowercase);
        let filtered = rows
            .into_iter()
            .filter(|row| {
                filter.account_id.is_none_or(|account_id| {
                    row.account_id == account_id
                        || row.transfer_account_id == Some(account_id)
                })
            })
            .filter(|row| {
                note_needle.as_deref().is_none_or(|needle| {
                    row.note
                        .as_deref()
                        .is_some_and(|note| note.to_lowercase().contains(needle))
                })
            })
            .filter(|row| filter.min_amount.is_none_or(|min| row.amount >= min))
            .filter(|row| filter.max_amount.is_none_or(|max| row.amount <= max))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();

        Ok(filtered)
    }
}

fn effect_account_ids(effects: &[AccountEffect]) -> BTreeSet<Uuid> {
    effects.iter().map(|e| e.account_id).collect()
}

/// Locks the given account rows in ascending id order, verifying each
/// belongs to the ledger.
async fn lock_accounts(
    txn: &DatabaseTransaction,
    ledger_id: Uuid,
    account_ids: BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, accounts::Model>, TransactionError> {
    let mut locked = HashMap::with_capacity(account_ids.len());
    for account_id in account_ids {
        let account = accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(TransactionError::AccountNotFound(account_id))?;
        if account.ledger_id != ledger_id {
            return Err(DomainError::AccountNotInLedger.into());
        }
        locked.insert(account_id, account);
    }
    Ok(locked)
}

/// Writes one balance patch per account. Callers must hold the row
/// locks for every account in `effects`.
async fn apply_effects(
    txn: &DatabaseTransaction,
    locked: &HashMap<Uuid, accounts::Model>,
    effects: &[AccountEffect],
) -> Result<(), TransactionError> {
    let now = now_millis();
    for effect in effects {
        let account = locked
            .get(&effect.account_id)
            .ok_or(TransactionError::AccountNotFound(effect.account_id))?;
        let mut active: accounts::ActiveModel = account.clone().into();
        active.current_balance = Set(account.current_balance + effect.delta);
        active.updated_at = Set(now);
        active.update(txn).await?;
    }
    Ok(())
}

/// Verifies a category exists in the ledger, is active, and matches the
/// transaction kind.
async fn assert_usable_category(
    txn: &DatabaseTransaction,
    ledger_id: Uuid,
    category_id: Uuid,
    kind: domain::TransactionKind,
) -> Result<(), TransactionError> {
    let category = categories::Entity::find_by_id(category_id)
        .one(txn)
        .await?
        .ok_or(TransactionError::CategoryNotFound(category_id))?;

    if category.ledger_id != ledger_id {
        return Err(DomainError::CategoryNotInLedger.into());
    }
    if !matches!(category.status, sea_orm_active_enums::EntityStatus::Active) {
        return Err(DomainError::CategoryInactive(category_id).into());
    }
    let category_kind: domain::CategoryKind = category.kind.into();
    if category_kind.transaction_kind() != kind {
        let expected = match kind {
            domain::TransactionKind::Expense => domain::CategoryKind::Expense,
            domain::TransactionKind::Income => domain::CategoryKind::Income,
            domain::TransactionKind::Transfer => {
                return Err(DomainError::TransferCannotHaveCategory.into());
            }
        };
        return Err(DomainError::CategoryKindMismatch {
            expected,
            found: category_kind,
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_choice_prefers_kind() {
        let filter = TransactionFilter {
            kind: Some(domain::TransactionKind::Expense),
            category_id: Some(Uuid::from_u128(1)),
            ..TransactionFilter::default()
        };
        assert_eq!(choose_listing_index(&filter), ListingIndex::KindTime);
    }

    #[test]
    fn test_index_choice_category_before_fallback() {
        let filter = TransactionFilter {
            category_id: Some(Uuid::from_u128(1)),
            ..TransactionFilter::default()
        };
        assert_eq!(choose_listing_index(&filter), ListingIndex::CategoryTime);
    }

    #[test]
    fn test_index_choice_falls_back_to_ledger_scan() {
        let filter = TransactionFilter {
            account_id: Some(Uuid::from_u128(1)),
            note_contains: Some("coffee".to_string()),
            ..TransactionFilter::default()
        };
        assert_eq!(choose_listing_index(&filter), ListingIndex::LedgerTime);
    }

    #[test]
    fn test_effect_account_ids_dedupes() {
        let a = Uuid::from_u128(1);
        let effects = [AccountEffect::new(a, -100), AccountEffect::new(a, 100)];
        assert_eq!(effect_account_ids(&effects).len(), 1);
    }
}
