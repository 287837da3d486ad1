//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};
use cashbook_shared::AppError;

pub mod accounts;
pub mod categories;
pub mod health;
pub mod ledgers;
pub mod reports;
pub mod transactions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(ledgers::routes())
        .merge(accounts::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Maps a domain error onto the wire: status from the error class, body
/// carrying the stable error code and a human-readable message.
pub(crate) fn error_response<E: Into<AppError>>(err: E) -> Response {
    let err: AppError = err.into();
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}
