use crate::auth::AuthUser;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/:id", delete(delete_category))
        .route("/:id/options", get(category_options))
}

/// Creates the router for option-axis endpoints
pub fn options_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_options))
        .route("/", post(create_option))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .category
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    #[serde(default)]
    parent_id: Option<Uuid>,
    #[serde(default)]
    option_ids: Vec<Uuid>,
}

async fn create_category(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .category
        .create_category(&payload.name, payload.parent_id, &payload.option_ids)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(category))
}

async fn delete_category(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .category
        .delete_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// The option axes (with values) the seller variant form offers for a
/// category
async fn category_options(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let options = state
        .services
        .category
        .options_for_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(options))
}

async fn list_options(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let options = state
        .services
        .category
        .list_options()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(options))
}

#[derive(Debug, Deserialize)]
struct CreateOptionRequest {
    name: String,
    #[serde(default)]
    values: Vec<String>,
}

async fn create_option(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOptionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let option = state
        .services
        .category
        .create_option(&payload.name, &payload.values)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(option))
}
