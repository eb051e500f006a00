use crate::auth::AuthUser;
use crate::handlers::common::{
    map_service_error, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::{ApiError, ServiceError},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for order endpoints (buyer history and order
/// detail/status)
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
}

/// Creates the router for seller-facing store order views, nested
/// under /stores
pub fn store_orders_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/orders", get(list_store_orders))
        .route("/:id/dashboard", get(store_dashboard))
}

/// The caller's order history, newest first
async fn my_orders(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .order
        .list_orders_for_buyer(&user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Order detail, visible to its buyer and to the store's owner
async fn get_order(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .order
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    if order.order.buyer_id != user.user_id {
        ensure_store_owner(&state, order.order.store_id, &user).await?;
    }

    Ok(success_response(order))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

/// Advance the order's status field (store owner only)
async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .order
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    ensure_store_owner(&state, order.order.store_id, &user).await?;

    let updated = state
        .services
        .order
        .update_status(id, &payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// One store's orders for the seller order table
async fn list_store_orders(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_store_owner(&state, id, &user).await?;

    let (orders, total) = state
        .services
        .order
        .list_orders_for_store(id, pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Aggregates for the seller dashboard
async fn store_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_store_owner(&state, id, &user).await?;

    let summary = state
        .services
        .order
        .store_dashboard(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

async fn ensure_store_owner(
    state: &AppState,
    store_id: Uuid,
    user: &AuthUser,
) -> Result<(), ApiError> {
    let store = state
        .services
        .store
        .get_store(store_id)
        .await
        .map_err(map_service_error)?;

    if store.owner_user_id != user.user_id {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "You do not own this store".to_string(),
        )));
    }
    Ok(())
}
