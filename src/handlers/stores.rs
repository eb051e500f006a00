use crate::auth::AuthUser;
use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

/// Creates the router for store endpoints
pub fn stores_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_store))
        .route("/me", get(my_store))
}

#[derive(Debug, Deserialize)]
struct CreateStoreRequest {
    name: String,
}

/// Create a store owned by the caller
async fn create_store(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateStoreRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let store = state
        .services
        .store
        .create_store(&user.user_id, &payload.name)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(store))
}

/// The caller's store id, or null when they have none yet
async fn my_store(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let store = state
        .services
        .store
        .find_store_for_owner(&user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "store_id": store.map(|s| s.id),
    })))
}
