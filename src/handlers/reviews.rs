use crate::auth::AuthUser;
use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for review endpoints
pub fn reviews_routes() -> Router<AppState> {
    Router::new().route("/", post(submit_review))
}

/// Router for the public per-product review listing, nested under
/// /products
pub fn product_reviews_routes() -> Router<AppState> {
    Router::new().route("/:id/reviews", get(list_product_reviews))
}

#[derive(Debug, Deserialize)]
struct SubmitReviewRequest {
    product_id: Uuid,
    rating: f64,
    #[serde(default)]
    comment: Option<String>,
}

/// Create or update the caller's review for a purchased product
async fn submit_review(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let review = state
        .services
        .review
        .submit_review(
            &user.user_id,
            payload.product_id,
            payload.rating,
            payload.comment,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(review))
}

/// Reviews for a product with the average rating
async fn list_product_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let reviews = state
        .services
        .review
        .list_for_product(id)
        .await
        .map_err(map_service_error)?;

    let average_rating = state
        .services
        .review
        .average_rating(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "reviews": reviews,
        "average_rating": average_rating,
    })))
}
