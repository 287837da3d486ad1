//! Liveness probe.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::AppState;

/// GET `/health` - Reports the service name and version. No auth, no
/// database round trip.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::health;

    #[tokio::test]
    async fn test_health_reports_service_identity() {
        let body = health().await.0;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], env!("CARGO_PKG_NAME"));
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
