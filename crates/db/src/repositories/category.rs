//! Category repository with case-insensitive uniqueness per ledger and
//! kind.

use cashbook_core::ledger::{CategoryKind, EntityStatus};
use cashbook_core::validation::{self, ValidationError};
use cashbook_shared::AppError;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, sea_orm_active_enums};

use super::now_millis;

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Category belongs to a different ledger.
    #[error("Category does not belong to this ledger")]
    NotInLedger,

    /// A category with the same name and kind already exists.
    #[error("Category already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::NotFound(err.to_string()),
            CategoryError::NotInLedger | CategoryError::AlreadyExists(_) => {
                Self::Conflict(err.to_string())
            }
            CategoryError::Validation(e) => e.into(),
            CategoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Partial patch for a category. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New display name.
    pub name: Option<String>,
    /// New status.
    pub status: Option<EntityStatus>,
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the categories of a ledger, optionally filtered by kind and
    /// status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        ledger_id: Uuid,
        kind: Option<CategoryKind>,
        status: Option<EntityStatus>,
    ) -> Result<Vec<categories::Model>, CategoryError> {
        let mut query =
            categories::Entity::find().filter(categories::Column::LedgerId.eq(ledger_id));

        if let Some(kind) = kind {
            let kind: sea_orm_active_enums::CategoryKind = kind.into();
            query = query.filter(categories::Column::Kind.eq(kind));
        }
        if let Some(status) = status {
            let status: sea_orm_active_enums::EntityStatus = status.into();
            query = query.filter(categories::Column::Status.eq(status));
        }

        let categories = query
            .order_by_asc(categories::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(categories)
    }

    /// Creates a category, rejecting case-insensitive duplicates within
    /// the same ledger and kind.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` on a duplicate name and an error if the
    /// name is empty or the insert fails.
    pub async fn create(
        &self,
        ledger_id: Uuid,
        name: &str,
        kind: CategoryKind,
        is_system: bool,
    ) -> Result<categories::Model, CategoryError> {
        let name = validation::required_name(name, "name")?;
        self.assert_name_free(ledger_id, kind, &name, None).await?;

        let now = now_millis();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            ledger_id: Set(ledger_id),
            name: Set(name),
            kind: Set(kind.into()),
            status: Set(sea_orm_active_enums::EntityStatus::Active),
            is_system: Set(is_system),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(category)
    }

    /// Applies a partial patch to a category. Renames go through the same
    /// duplicate check as creation; the kind is immutable.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is missing, belongs to a
    /// different ledger, the new name is empty, or it collides with an
    /// existing category.
    pub async fn update(
        &self,
        ledger_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let category = categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(category_id))?;

        if category.ledger_id != ledger_id {
            return Err(CategoryError::NotInLedger);
        }

        let kind: CategoryKind = category.kind.clone().into();
        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            let name = validation::required_name(&name, "name")?;
            self.assert_name_free(ledger_id, kind, &name, Some(category_id))
                .await?;
            active.name = Set(name);
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }
        active.updated_at = Set(now_millis());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Checks that no other category of the same kind in the ledger uses
    /// the name, comparing case-insensitively.
    async fn assert_name_free(
        &self,
        ledger_id: Uuid,
        kind: CategoryKind,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), CategoryError> {
        let kind: sea_orm_active_enums::CategoryKind = kind.into();
        let mut query = categories::Entity::find()
            .filter(categories::Column::LedgerId.eq(ledger_id))
            .filter(categories::Column::Kind.eq(kind))
            .filter(
                Expr::expr(Func::lower(Expr::col(categories::Column::Name)))
                    .eq(name.to_lowercase()),
            );

        if let Some(exclude) = exclude {
            query = query.filter(categories::Column::Id.ne(exclude));
        }

        if query.one(&self.db).await?.is_some() {
            return Err(CategoryError::AlreadyExists(name.to_string()));
        }

        Ok(())
    }
}
