//! Report routes: monthly summary, category breakdown, trend.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cashbook_core::ledger::CategoryKind;
use cashbook_core::reports::Granularity;
use cashbook_db::{LedgerRepository, ReportRepository};

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ledgers/{ledger_id}/reports/monthly-summary",
            get(monthly_summary),
        )
        .route(
            "/ledgers/{ledger_id}/reports/category-breakdown",
            get(category_breakdown),
        )
        .route("/ledgers/{ledger_id}/reports/trend", get(trend))
}

/// Query parameters for month-scoped reports.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 through 12.
    pub month: u32,
}

/// Query parameters for the category breakdown.
#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Which side to break down: expense or income.
    pub kind: String,
}

/// Query parameters for the trend report.
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// Inclusive lower bound, milliseconds since epoch.
    pub from: Option<i64>,
    /// Inclusive upper bound, milliseconds since epoch.
    pub to: Option<i64>,
    /// Bucket granularity: day or month. Defaults to day.
    pub granularity: Option<String>,
}

/// GET `/ledgers/{ledger_id}/reports/monthly-summary` - Month totals.
async fn monthly_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let repo = ReportRepository::new((*state.db).clone());
    match repo.monthly_summary(ledger_id, query.year, query.month).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build monthly summary");
            error_response(e)
        }
    }
}

/// GET `/ledgers/{ledger_id}/reports/category-breakdown` - Per-category
/// totals for one kind in one month, largest first.
async fn category_breakdown(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<BreakdownQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let Ok(kind) = query.kind.parse::<CategoryKind>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "INVALID_ARGUMENT",
                "message": "Invalid kind. Must be one of: expense, income"
            })),
        )
            .into_response();
    };

    let repo = ReportRepository::new((*state.db).clone());
    match repo
        .category_breakdown(ledger_id, query.year, query.month, kind)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(json!({ "categories": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build category breakdown");
            error_response(e)
        }
    }
}

/// GET `/ledgers/{ledger_id}/reports/trend` - Income/expense/net points
/// bucketed by day or month.
async fn trend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<TrendQuery>,
) -> impl IntoResponse {
    let ledger_repo = LedgerRepository::new((*state.db).clone());
    if let Err(e) = ledger_repo.require_owner(ledger_id, auth.user_id()).await {
        return error_response(e);
    }

    let granularity = match query.granularity.as_deref() {
        None | Some("day") => Granularity::Day,
        Some("month") => Granularity::Month,
        Some(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "INVALID_ARGUMENT",
                    "message": "Invalid granularity. Must be one of: day, month"
                })),
            )
                .into_response();
        }
    };

    let repo = ReportRepository::new((*state.db).clone());
    match repo.trend(ledger_id, query.from, query.to, granularity).await {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build trend");
            error_response(e)
        }
    }
}
