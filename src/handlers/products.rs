use crate::auth::AuthUser;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::{ApiError, ServiceError},
    services::commerce::product_catalog_service::{CreateVariantInput, UpdateProductInput},
    services::commerce::CreateProductInput,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/availability", post(toggle_availability))
        .route("/:id/resolve", post(resolve_selection))
}

/// Storefront listing of available products with derived price ranges
async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (listings, total) = state
        .services
        .product_catalog
        .list_available_products(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        listings,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Product page payload: product, images, variants with attributes,
/// and the seeded default selection
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .product_catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    let default_selection = state
        .services
        .product_catalog
        .default_selection(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "product": details.product,
        "images": details.images,
        "variants": details.variants,
        "default_selection": default_selection,
    })))
}

#[derive(Debug, Deserialize)]
struct ResolveSelectionRequest {
    #[serde(default)]
    selection: HashMap<String, String>,
}

/// Resolves a (possibly partial) option selection to a purchasable
/// variant. A null result means the combination is incomplete or not
/// offered; the storefront keeps prompting.
async fn resolve_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveSelectionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let resolved = state
        .services
        .product_catalog
        .resolve_selection(id, &payload.selection)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({ "variant": resolved })))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateProductRequest {
    pub store_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_price: Decimal,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub variants: Vec<CreateVariantInput>,
}

fn default_true() -> bool {
    true
}

/// Create a product in the caller's store
async fn create_product(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    ensure_store_owner(&state, payload.store_id, &user).await?;

    let product = state
        .services
        .product_catalog
        .create_product(CreateProductInput {
            store_id: payload.store_id,
            category_id: payload.category_id,
            name: payload.name,
            description: payload.description,
            base_price: payload.base_price,
            is_available: payload.is_available,
            image_urls: payload.image_urls,
            variants: payload.variants,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// Update a product; `Some` image/variant sets replace the previous ones
async fn update_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_product_owner(&state, id, &user).await?;

    let product = state
        .services
        .product_catalog
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn delete_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_product_owner(&state, id, &user).await?;

    state
        .services
        .product_catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Flip the availability flag; returns the new value
async fn toggle_availability(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_product_owner(&state, id, &user).await?;

    let is_available = state
        .services
        .product_catalog
        .toggle_availability(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        serde_json::json!({ "is_available": is_available }),
    ))
}

/// The caller must own the store they are writing into
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

async fn ensure_product_owner(
    state: &AppState,
    product_id: Uuid,
    user: &AuthUser,
) -> Result<(), ApiError> {
    let details = state
        .services
        .product_catalog
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    ensure_store_owner(state, details.product.store_id, user).await
}
