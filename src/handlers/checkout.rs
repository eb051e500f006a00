use crate::auth::MaybeAuthUser;
use crate::handlers::common::created_response;
use crate::{
    errors::{ApiError, CheckoutError},
    services::commerce::{BuyerIdentity, ShippingAddressInput},
    AppState,
};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;

/// Creates the router for the checkout endpoint
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(place_order))
}

/// The submitted checkout form: shipping fields plus the client cart
/// snapshot exactly as the cart store serialized it. The snapshot is
/// passed through opaquely; the checkout service decodes and distrusts
/// it.
#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    shipping: ShippingAddressInput,
    items: serde_json::Value,
}

/// Place an order from the client cart snapshot
async fn place_order(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // Anonymous checkout is a distinct, user-reportable failure
    let user = user.ok_or(CheckoutError::Unauthorized)?;

    let buyer = BuyerIdentity {
        external_id: user.user_id.clone(),
        name: user.display_name(),
        email: user.email.clone().unwrap_or_default(),
    };

    let placed = state
        .services
        .checkout
        .place_order(&buyer, payload.shipping, payload.items)
        .await?;

    Ok(created_response(placed))
}
