//! Account repository: CRUD, manual balance adjustments, and the
//! adjustment audit listing.

use cashbook_core::ledger::{AccountKind, EntityStatus};
use cashbook_core::validation::{self, ValidationError};
use cashbook_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{accounts, balance_adjustments};

use super::now_millis;

/// Default and maximum page size for the adjustment audit listing.
const ADJUSTMENTS_DEFAULT_LIMIT: u64 = 20;
const ADJUSTMENTS_MAX_LIMIT: u64 = 200;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Account belongs to a different ledger.
    #[error("Account does not belong to this ledger")]
    NotInLedger,

    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::NotInLedger => Self::Conflict(err.to_string()),
            AccountError::Validation(e) => e.into(),
            AccountError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Ledger the account belongs to.
    pub ledger_id: Uuid,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub kind: AccountKind,
    /// Opening balance in minor units. May be negative (credit cards).
    pub initial_balance: i64,
}

/// Partial patch for an account. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New account kind.
    pub kind: Option<AccountKind>,
    /// New status.
    pub status: Option<EntityStatus>,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the accounts of a ledger, optionally filtered by status,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        ledger_id: Uuid,
        status: Option<EntityStatus>,
    ) -> Result<Vec<accounts::Model>, AccountError> {
        let mut query =
            accounts::Entity::find().filter(accounts::Column::LedgerId.eq(ledger_id));

        if let Some(status) = status {
            let status: crate::entities::sea_orm_active_enums::EntityStatus = status.into();
            query = query.filter(accounts::Column::Status.eq(status));
        }

        let accounts = query
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(accounts)
    }

    /// Creates an account with `current_balance` starting at the opening
    /// balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the insert fails.
    pub async fn create(&self, input: CreateAccountInput) -> Result<accounts::Model, AccountError> {
        let name = validation::required_name(&input.name, "name")?;
        let now = now_millis();

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            ledger_id: Set(input.ledger_id),
            name: Set(name),
            kind: Set(input.kind.into()),
            status: Set(crate::entities::sea_orm_active_enums::EntityStatus::Active),
            initial_balance: Set(input.initial_balance),
            current_balance: Set(input.initial_balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(account)
    }

    /// Applies a partial patch to an account. The opening balance is
    /// immutable and the live balance only moves through transactions
    /// and adjustments, so neither is patchable here.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing, belongs to a different
    /// ledger, or a provided name is empty.
    pub async fn update(
        &self,
        ledger_id: Uuid,
        account_id: Uuid,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.find_in_ledger(ledger_id, account_id).await?;

        let mut active: accounts::ActiveModel = account.into();
        if let Some(name) = input.name {
            active.name = Set(validation::required_name(&name, "name")?);
        }
        if let Some(kind) = input.kind {
            active.kind = Set(kind.into());
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }
        active.updated_at = Set(now_millis());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Applies a manual balance correction and records it in the audit
    /// trail. Runs in a database transaction with the account row locked
    /// so concurrent mutations cannot lose the update.
    ///
    /// # Errors
    ///
    /// Returns an error if the delta is zero, a supplied reason is empty,
    /// or the account is missing.
    pub async fn adjust_balance(
        &self,
        ledger_id: Uuid,
        account_id: Uuid,
        actor_user_id: Uuid,
        delta: i64,
        reason: Option<&str>,
    ) -> Result<accounts::Model, AccountError> {
        validation::non_zero_delta(delta, "delta")?;
        let reason = match reason {
            Some(reason) => Some(validation::required_name(reason, "reason")?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let account = lock_account(&txn, ledger_id, account_id).await?;

        let balance_before = account.current_balance;
        let balance_after = balance_before + delta;
        let now = now_millis();

        let mut active: accounts::ActiveModel = account.into();
        active.current_balance = Set(balance_after);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        balance_adjustments::ActiveModel {
            id: Set(Uuid::new_v4()),
            ledger_id: Set(ledger_id),
            account_id: Set(account_id),
            actor_user_id: Set(actor_user_id),
            delta: Set(delta),
            balance_before: Set(balance_before),
            balance_after: Set(balance_after),
            reason: Set(reason),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            account_id = %account_id,
            delta = delta,
            balance_after = balance_after,
            "balance adjusted"
        );
        Ok(updated)
    }

    /// Lists balance adjustments for a ledger, newest first, optionally
    /// scoped to one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the limit is out of bounds, a supplied account
    /// filter is missing or belongs to a different ledger, or the query
    /// fails.
    pub async fn list_adjustments(
        &self,
        ledger_id: Uuid,
        account_id: Option<Uuid>,
        limit: Option<u64>,
    ) -> Result<Vec<balance_adjustments::Model>, AccountError> {
        let limit =
            validation::bounded_limit(limit, ADJUSTMENTS_DEFAULT_LIMIT, ADJUSTMENTS_MAX_LIMIT)?;

        let mut query = balance_adjustments::Entity::find()
            .filter(balance_adjustments::Column::LedgerId.eq(ledger_id));

        if let Some(account_id) = account_id {
            // Reject filters on foreign or missing accounts instead of
            // silently returning an empty page.
            self.find_in_ledger(ledger_id, account_id).await?;
            query = query.filter(balance_adjustments::Column::AccountId.eq(account_id));
        }

        let adjustments = query
            .order_by_desc(balance_adjustments::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(adjustments)
    }

    async fn find_in_ledger(
        &self,
        ledger_id: Uuid,
        account_id: Uuid,
    ) -> Result<accounts::Model, AccountError> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(account_id))?;

        if account.ledger_id != ledger_id {
            return Err(AccountError::NotInLedger);
        }

        Ok(account)
    }
}

/// Loads an account inside a transaction with a `FOR UPDATE` row lock,
/// verifying ledger membership.
pub(crate) async fn lock_account(
    txn: &DatabaseTransaction,
    ledger_id: Uuid,
    account_id: Uuid,
) -> Result<accounts::Model, AccountError> {
    let account = accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(AccountError::NotFound(account_id))?;

    if account.ledger_id != ledger_id {
        return Err(AccountError::NotInLedger);
    }

    Ok(account)
}
