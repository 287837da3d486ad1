//! Ledger routes: listing, default-ledger bootstrap, renaming.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cashbook_db::{LedgerRepository, entities::ledgers};

/// Creates the ledger routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledgers", get(list_ledgers))
        .route("/ledgers/default", post(ensure_default_ledger))
        .route("/ledgers/{ledger_id}", put(rename_ledger))
}

/// Request body for renaming a ledger.
#[derive(Debug, Deserialize)]
pub struct RenameLedgerRequest {
    /// New ledger name.
    pub name: String,
}

fn ledger_json(ledger: &ledgers::Model) -> serde_json::Value {
    json!({
        "id": ledger.id,
        "name": ledger.name,
        "is_default": ledger.is_default,
        "created_at": ledger.created_at,
        "updated_at": ledger.updated_at
    })
}

/// GET `/ledgers` - List the caller's ledgers.
async fn list_ledgers(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.list_for_user(auth.user_id()).await {
        Ok(ledgers) => {
            let ledgers: Vec<_> = ledgers.iter().map(ledger_json).collect();
            (StatusCode::OK, Json(json!({ "ledgers": ledgers }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list ledgers");
            error_response(e)
        }
    }
}

/// POST `/ledgers/default` - Return the caller's default ledger, creating
/// and seeding it on first use.
async fn ensure_default_ledger(
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.ensure_default(auth.user_id()).await {
        Ok(ledger) => (StatusCode::OK, Json(ledger_json(&ledger))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to ensure default ledger");
            error_response(e)
        }
    }
}

/// PUT `/ledgers/{ledger_id}` - Rename a ledger.
async fn rename_ledger(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<RenameLedgerRequest>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.rename(ledger_id, auth.user_id(), &payload.name).await {
        Ok(ledger) => {
            info!(ledger_id = %ledger_id, "Ledger renamed");
            (StatusCode::OK, Json(ledger_json(&ledger))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to rename ledger");
            error_response(e)
        }
    }
}
