use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

/// Liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database": "up",
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "degraded",
                "database": "down",
            })),
        ),
    }
}
