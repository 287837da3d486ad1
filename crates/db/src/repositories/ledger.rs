//! Ledger repository: ownership checks and default-ledger bootstrap.

use cashbook_core::ledger::CategoryKind;
use cashbook_core::validation::{self, ValidationError};
use cashbook_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{categories, ledgers, sea_orm_active_enums::EntityStatus};

use super::now_millis;

/// Name given to the ledger created on first use.
const DEFAULT_LEDGER_NAME: &str = "Personal";

/// Categories seeded into every new ledger.
const SEED_EXPENSE_CATEGORIES: [&str; 5] =
    ["Food", "Transport", "Housing", "Shopping", "Entertainment"];
const SEED_INCOME_CATEGORIES: [&str; 4] = ["Salary", "Bonus", "Part-time", "Other"];

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Ledger not found.
    #[error("Ledger not found: {0}")]
    NotFound(Uuid),

    /// Ledger is owned by a different user.
    #[error("Ledger does not belong to this user")]
    NotOwned,

    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::NotOwned => Self::Forbidden(err.to_string()),
            LedgerError::Validation(e) => e.into(),
            LedgerError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads a ledger and verifies the given user owns it.
    ///
    /// Every mutation in the system starts here.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ledger does not exist and `NotOwned` if
    /// it belongs to someone else.
    pub async fn require_owner(
        &self,
        ledger_id: Uuid,
        user_id: Uuid,
    ) -> Result<ledgers::Model, LedgerError> {
        let ledger = ledgers::Entity::find_by_id(ledger_id)
            .one(&self.db)
            .await?
            .ok_or(LedgerError::NotFound(ledger_id))?;

        if ledger.owner_user_id != user_id {
            return Err(LedgerError::NotOwned);
        }

        Ok(ledger)
    }

    /// Lists the ledgers owned by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ledgers::Model>, LedgerError> {
        let ledgers = ledgers::Entity::find()
            .filter(ledgers::Column::OwnerUserId.eq(user_id))
            .order_by_asc(ledgers::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(ledgers)
    }

    /// Returns the user's default ledger, creating one with seeded system
    /// categories if the user has none yet. The `is_default` flag marks it;
    /// a partial unique index keeps it to one per user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn ensure_default(&self, user_id: Uuid) -> Result<ledgers::Model, LedgerError> {
        let existing = ledgers::Entity::find()
            .filter(ledgers::Column::OwnerUserId.eq(user_id))
            .filter(ledgers::Column::IsDefault.eq(true))
            .one(&self.db)
            .await?;

        if let Some(ledger) = existing {
            return Ok(ledger);
        }

        let now = now_millis();
        let txn = self.db.begin().await?;

        let ledger = ledgers::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(user_id),
            name: Set(DEFAULT_LEDGER_NAME.to_string()),
            is_default: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let seeds = SEED_EXPENSE_CATEGORIES
            .iter()
            .map(|name| (*name, CategoryKind::Expense))
            .chain(
                SEED_INCOME_CATEGORIES
                    .iter()
                    .map(|name| (*name, CategoryKind::Income)),
            );
        for (name, kind) in seeds {
            categories::ActiveModel {
                id: Set(Uuid::new_v4()),
                ledger_id: Set(ledger.id),
                name: Set(name.to_string()),
                kind: Set(kind.into()),
                status: Set(EntityStatus::Active),
                is_system: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(ledger_id = %ledger.id, user_id = %user_id, "seeded default ledger");
        Ok(ledger)
    }

    /// Renames a ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger is missing, not owned by the user,
    /// or the new name is empty.
    pub async fn rename(
        &self,
        ledger_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> Result<ledgers::Model, LedgerError> {
        let name = validation::required_name(name, "name")?;
        let ledger = self.require_owner(ledger_id, user_id).await?;

        let mut active: ledgers::ActiveModel = ledger.into();
        active.name = Set(name);
        active.updated_at = Set(now_millis());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}
