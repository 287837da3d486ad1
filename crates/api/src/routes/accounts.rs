//! Account routes: CRUD, manual balance adjustments, and the adjustment
//! audit listing.

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
use cashbook_core::ledger::{AccountKind, EntityStatus};
use cashbook_db::{
    AccountRepository, LedgerRepository,
    entities::{accounts, balance_adjustments},
    repositories::account::{CreateAccountInput, UpdateAccountInput},
};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledgers/{ledger_id}/accounts", get(list_accounts))
        .route("/ledgers/{ledger_id}/accounts", post(create_account))
        .route(
            "/ledgers/{ledger_id}/accounts/{account_id}",
            put(update_account),
        )
        .route(
            "/ledgers/{ledger_id}/accounts/{account_id}/adjustments",
            post(adjust_balance),
        )
        .route("/ledgers/{ledger_id}/adjustments", get(list_adjustments))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by status: active or inactive.
    pub status: Option<String>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account name.
    pub name: String,
    /// Account kind: cash, bank, credit, wallet.
    pub kind: String,
    /// Opening balance in minor units. Defaults to 0.
    pub initial_balance: Option<i64>,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// Account name.
    pub name: Option<String>,
    /// Account kind.
    pub kind: Option<String>,
    /// Account status.
    pub status: Option<String>,
}

/// Request body for adjusting an account balance.
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceRequest {
    /// Signed delta in minor units, non-zero.
    pub delta: i64,
    /// Optional reason recorded in the audit trail.
    pub reason: Option<String>,
}

/// Query parameters for the adjustment audit listing.
#[derive(Debug, Deserialize)]
pub struct ListAdjustmentsQuery {
    /// Scope to a single account.
    pub account_id: Option<Uuid>,
    /// Result cap, 1 through 200, default 20.
    pub limit: Option<u64>,
}

fn account_json(account: &accounts::Model) -> serde_json::Value {
    json!({
        "id": account.id,
        "ledger_id": account.ledger_id,
        "name": account.name,
        "kind": account.kind,
        "status": account.status,
        "initial_balance": account.initial_balance,
        "current_balance": account.current_balance,
        "created_at": account.created_at,
        "updated_at": account.updated_at
    })
}

fn adjustment_json(adjustment: &balance_adjustments::Model) -> serde_json::Value {
    json!({
        "id": adjustment.id,
        "account_id": adjustment.account_id,
        "actor_user_id": adjustment.actor_user_id,
        "delta": adjustment.delta,
        "balance_before": adjustment.balance_before,
        "balance_after": adjustment.balance_after,
        "reason": adjustment.reason,
        "created_at": adjustment.created_at
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

/// GET `/ledgers/{ledger_id}/accounts` - List accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ListAccountsQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let status = match query.status.as_deref().map(str::parse::<EntityStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return invalid_field("status", "active, inactive"),
    };

    let repo = AccountRepository::new((*state.db).clone());
    match repo.list(ledger_id, status).await {
        Ok(accounts) => {
            let accounts: Vec<_> = accounts.iter().map(account_json).collect();
            (StatusCode::OK, Json(json!({ "accounts": accounts }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list accounts");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let Ok(kind) = payload.kind.parse::<AccountKind>() else {
        return invalid_field("kind", "cash, bank, credit, wallet");
    };

    let repo = AccountRepository::new((*state.db).clone());
    let input = CreateAccountInput {
        ledger_id,
        name: payload.name,
        kind,
        initial_balance: payload.initial_balance.unwrap_or(0),
    };

    match repo.create(input).await {
        Ok(account) => {
            info!(ledger_id = %ledger_id, account_id = %account.id, "Account created");
            (StatusCode::CREATED, Json(account_json(&account))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create account");
            error_response(e)
        }
    }
}

/// PUT `/ledgers/{ledger_id}/accounts/{account_id}` - Update an account.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((ledger_id, account_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let kind = match payload.kind.as_deref().map(str::parse::<AccountKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(_)) => return invalid_field("kind", "cash, bank, credit, wallet"),
    };
    let status = match payload.status.as_deref().map(str::parse::<EntityStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return invalid_field("status", "active, inactive"),
    };

    let repo = AccountRepository::new((*state.db).clone());
    let input = UpdateAccountInput {
        name: payload.name,
        kind,
        status,
    };

    match repo.update(ledger_id, account_id, input).await {
        Ok(account) => {
            info!(ledger_id = %ledger_id, account_id = %account_id, "Account updated");
            (StatusCode::OK, Json(account_json(&account))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update account");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/accounts/{account_id}/adjustments` - Apply
/// a manual balance correction.
async fn adjust_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((ledger_id, account_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdjustBalanceRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = AccountRepository::new((*state.db).clone());
    match repo
        .adjust_balance(
            ledger_id,
            account_id,
            auth.user_id(),
            payload.delta,
            payload.reason.as_deref(),
        )
        .await
    {
        Ok(account) => {
            info!(account_id = %account_id, delta = payload.delta, "Balance adjusted");
            (StatusCode::OK, Json(account_json(&account))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to adjust balance");
            error_response(e)
        }
    }
}

/// GET `/ledgers/{ledger_id}/adjustments` - List balance adjustments,
/// newest first.
async fn list_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ListAdjustmentsQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = AccountRepository::new((*state.db).clone());
    match repo
        .list_adjustments(ledger_id, query.account_id, query.limit)
        .await
    {
        Ok(adjustments) => {
            let adjustments: Vec<_> = adjustments.iter().map(adjustment_json).collect();
            (StatusCode::OK, Json(json!({ "adjustments": adjustments }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list adjustments");
            error_response(e)
        }
    }
}
