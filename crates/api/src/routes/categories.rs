//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cashbook_core::ledger::{CategoryKind, EntityStatus};
use cashbook_db::{
    CategoryRepository, LedgerRepository, entities::categories,
    repositories::category::UpdateCategoryInput,
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledgers/{ledger_id}/categories", get(list_categories))
        .route("/ledgers/{ledger_id}/categories", post(create_category))
        .route(
            "/ledgers/{ledger_id}/categories/{category_id}",
            put(update_category),
        )
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Filter by kind: expense or income.
    pub kind: Option<String>,
    /// Filter by status: active or inactive.
    pub status: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name, unique case-insensitively per ledger and kind.
    pub name: String,
    /// Category kind: expense or income.
    pub kind: String,
    /// Marks a seeded system category. Defaults to false.
    #[serde(default)]
    pub is_system: bool,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New category name.
    pub name: Option<String>,
    /// New status.
    pub status: Option<String>,
}

fn category_json(category: &categories::Model) -> serde_json::Value {
    json!({
        "id": category.id,
        "ledger_id": category.ledger_id,
        "name": category.name,
        "kind": category.kind,
        "status": category.status,
        "is_system": category.is_system,
        "created_at": category.created_at,
        "updated_at": category.updated_at
    })
}

fn invalid_field(field: &str, expected: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "INVALID_ARGUMENT",
            "message": format!("Invalid {field}. Must be one of: {expected}")
        })),
    )
        .into_response()
}

/// GET `/ledgers/{ledger_id}/categories` - List categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ListCategoriesQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let kind = match query.kind.as_deref().map(str::parse::<CategoryKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(_)) => return invalid_field("kind", "expense, income"),
    };
    let status = match query.status.as_deref().map(str::parse::<EntityStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return invalid_field("status", "active, inactive"),
    };

    let repo = CategoryRepository::new((*state.db).clone());
    match repo.list(ledger_id, kind, status).await {
        Ok(categories) => {
            let categories: Vec<_> = categories.iter().map(category_json).collect();
            (StatusCode::OK, Json(json!({ "categories": categories }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let Ok(kind) = payload.kind.parse::<CategoryKind>() else {
        return invalid_field("kind", "expense, income");
    };

    let repo = CategoryRepository::new((*state.db).clone());
    match repo
        .create(ledger_id, &payload.name, kind, payload.is_system)
        .await
    {
        Ok(category) => {
            info!(ledger_id = %ledger_id, category_id = %category.id, "Category created");
            (StatusCode::CREATED, Json(category_json(&category))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create category");
            error_response(e)
        }
    }
}

/// PUT `/ledgers/{ledger_id}/categories/{category_id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((ledger_id, category_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let status = match payload.status.as_deref().map(str::parse::<EntityStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return invalid_field("status", "active, inactive"),
    };

    let repo = CategoryRepository::new((*state.db).clone());
    let input = UpdateCategoryInput {
        name: payload.name,
        status,
    };

    match repo.update(ledger_id, category_id, input).await {
        Ok(category) => {
            info!(ledger_id = %ledger_id, category_id = %category_id, "Category updated");
            (StatusCode::OK, Json(category_json(&category))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update category");
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CreateCategoryRequest;

    #[test]
    fn test_create_request_is_system_defaults_to_false() {
        let req: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Books","kind":"expense"}"#).unwrap();
        assert!(!req.is_system);
    }

    #[test]
    fn test_create_request_accepts_is_system() {
        let req: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Refunds","kind":"income","is_system":true}"#)
                .unwrap();
        assert!(req.is_system);
    }
}
