//! Transaction routes: creation, in-place edits, deletion, and the
//! filtered listing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cashbook_core::ledger::TransactionKind;
use cashbook_db::{
    LedgerRepository, TransactionRepository,
    entities::transactions,
    repositories::transaction::{TransactionFilter, TransactionPatch},
};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledgers/{ledger_id}/transactions", get(list_transactions))
        .route(
            "/ledgers/{ledger_id}/transactions/expense",
            post(create_expense),
        )
        .route(
            "/ledgers/{ledger_id}/transactions/income",
            post(create_income),
        )
        .route(
            "/ledgers/{ledger_id}/transactions/transfer",
            post(create_transfer),
        )
        .route(
            "/ledgers/{ledger_id}/transactions/{transaction_id}",
            patch(update_transaction),
        )
        .route(
            "/ledgers/{ledger_id}/transactions/{transaction_id}",
            delete(delete_transaction),
        )
}

/// Request body for creating an expense or income.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Account the money moves through.
    pub account_id: Uuid,
    /// Category, matching the transaction kind.
    pub category_id: Uuid,
    /// Amount in minor units, positive.
    pub amount: i64,
    /// When the transaction occurred, milliseconds since epoch.
    pub occurred_at: i64,
    /// Optional note.
    pub note: Option<String>,
}

/// Request body for creating a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Source account.
    pub from_account_id: Uuid,
    /// Destination account, distinct from the source.
    pub to_account_id: Uuid,
    /// Amount in minor units, positive.
    pub amount: i64,
    /// When the transfer occurred, milliseconds since epoch.
    pub occurred_at: i64,
    /// Optional note.
    pub note: Option<String>,
}

/// Request body for patching a transaction. The kind is immutable.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
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
    #[serde(default)]
    pub clear_note: bool,
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by kind: expense, income, transfer.
    pub kind: Option<String>,
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

fn transaction_json(row: &transactions::Model) -> serde_json::Value {
    json!({
        "id": row.id,
        "ledger_id": row.ledger_id,
        "kind": row.kind,
        "amount": row.amount,
        "account_id": row.account_id,
        "transfer_account_id": row.transfer_account_id,
        "category_id": row.category_id,
        "note": row.note,
        "occurred_at": row.occurred_at,
        "created_at": row.created_at,
        "updated_at": row.updated_at
    })
}

/// GET `/ledgers/{ledger_id}/transactions` - List transactions, newest
/// first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let kind = match query.kind.as_deref().map(str::parse::<TransactionKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "INVALID_ARGUMENT",
                    "message": "Invalid kind. Must be one of: expense, income, transfer"
                })),
            )
                .into_response();
        }
    };

    let filter = TransactionFilter {
        kind,
        account_id: query.account_id,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
        note_contains: query.note_contains,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        limit: query.limit,
    };

    let repo = TransactionRepository::new((*state.db).clone());
    match repo.list(ledger_id, filter).await {
        Ok(rows) => {
            let transactions: Vec<_> = rows.iter().map(transaction_json).collect();
            (
                StatusCode::OK,
                Json(json!({ "transactions": transactions })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list transactions");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/transactions/expense` - Create an expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = TransactionRepository::new((*state.db).clone());
    match repo
        .create_expense(
            ledger_id,
            payload.account_id,
            payload.category_id,
            payload.amount,
            payload.occurred_at,
            payload.note.as_deref(),
        )
        .await
    {
        Ok(row) => {
            info!(transaction_id = %row.id, "Expense created");
            (StatusCode::CREATED, Json(transaction_json(&row))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create expense");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/transactions/income` - Create an income.
async fn create_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = TransactionRepository::new((*state.db).clone());
    match repo
        .create_income(
            ledger_id,
            payload.account_id,
            payload.category_id,
            payload.amount,
            payload.occurred_at,
            payload.note.as_deref(),
        )
        .await
    {
        Ok(row) => {
            info!(transaction_id = %row.id, "Income created");
            (StatusCode::CREATED, Json(transaction_json(&row))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create income");
            error_response(e)
        }
    }
}

/// POST `/ledgers/{ledger_id}/transactions/transfer` - Create a transfer.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = TransactionRepository::new((*state.db).clone());
    match repo
        .create_transfer(
            ledger_id,
            payload.from_account_id,
            payload.to_account_id,
            payload.amount,
            payload.occurred_at,
            payload.note.as_deref(),
        )
        .await
    {
        Ok(row) => {
            info!(transaction_id = %row.id, "Transfer created");
            (StatusCode::CREATED, Json(transaction_json(&row))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create transfer");
            error_response(e)
        }
    }
}

/// PATCH `/ledgers/{ledger_id}/transactions/{transaction_id}` - Edit a
/// transaction in place with a delta-based rebalance.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((ledger_id, transaction_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let patch = TransactionPatch {
        amount: payload.amount,
        occurred_at: payload.occurred_at,
        account_id: payload.account_id,
        transfer_account_id: payload.transfer_account_id,
        category_id: payload.category_id,
        note: payload.note,
        clear_note: payload.clear_note,
    };

    let repo = TransactionRepository::new((*state.db).clone());
    match repo.update(ledger_id, transaction_id, patch).await {
        Ok(row) => {
            info!(transaction_id = %transaction_id, "Transaction updated");
            (StatusCode::OK, Json(transaction_json(&row))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update transaction");
            error_response(e)
        }
    }
}

/// DELETE `/ledgers/{ledger_id}/transactions/{transaction_id}` - Delete a
/// transaction, reversing its balance effects.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((ledger_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = TransactionRepository::new((*state.db).clone());
    match repo.remove(ledger_id, transaction_id).await {
        Ok(id) => {
            info!(transaction_id = %id, "Transaction deleted");
            (StatusCode::OK, Json(json!({ "transaction_id": id }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to delete transaction");
            error_response(e)
        }
    }
}
