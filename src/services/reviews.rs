use crate::{
    entities::{
        order, order_item, product_variant, review, Buyer, Order, OrderItem, ProductVariant,
        Review, ReviewModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Product reviews: one per buyer per product, gated on the buyer
/// having actually purchased the product
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// A review with the reviewer's display name
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithBuyer {
    #[serde(flatten)]
    pub review: ReviewModel,
    pub buyer_name: String,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates or updates the buyer's review for a product.
    ///
    /// Ratings are rounded to the nearest integer and must land in
    /// 1..=5. A buyer who never purchased the product is rejected.
    #[instrument(skip(self, comment))]
    pub async fn submit_review(
        &self,
        buyer_id: &str,
        product_id: Uuid,
        rating: f64,
        comment: Option<String>,
    ) -> Result<ReviewModel, ServiceError> {
        if !rating.is_finite() || !(1.0..=5.0).contains(&rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let rating = rating.round() as i32;

        if !self.has_purchased(buyer_id, product_id).await? {
            return Err(ServiceError::Forbidden(
                "You can only review products you purchased".to_string(),
            ));
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let existing = Review::find()
            .filter(review::Column::BuyerId.eq(buyer_id))
            .filter(review::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        let saved = match existing {
            Some(current) => {
                let mut update: review::ActiveModel = current.into();
                update.rating = Set(rating);
                update.comment = Set(comment);
                update.updated_at = Set(Utc::now());
                update.update(&*self.db).await?
            }
            None => {
                let row = review::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    buyer_id: Set(buyer_id.to_string()),
                    rating: Set(rating),
                    comment: Set(comment),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                };
                row.insert(&*self.db).await?
            }
        };

        self.event_sender
            .send_or_log(Event::ReviewSubmitted { product_id, rating })
            .await;

        Ok(saved)
    }

    /// Reviews for a product with reviewer names, newest first
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewWithBuyer>, ServiceError> {
        let reviews = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(reviews.len());
        for rev in reviews {
            let buyer_name = Buyer::find_by_id(rev.buyer_id.clone())
                .one(&*self.db)
                .await?
                .map(|b| b.name)
                .unwrap_or_else(|| "Unknown".to_string());
            result.push(ReviewWithBuyer {
                review: rev,
                buyer_name,
            });
        }
        Ok(result)
    }

    /// Mean rating across a product's reviews, `None` when unreviewed
    pub async fn average_rating(&self, product_id: Uuid) -> Result<Option<f64>, ServiceError> {
        let reviews = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;

        if reviews.is_empty() {
            return Ok(None);
        }
        let total: i32 = reviews.iter().map(|r| r.rating).sum();
        Ok(Some(f64::from(total) / reviews.len() as f64))
    }

    /// True when some order of this buyer contains a variant of the
    /// product
    async fn has_purchased(&self, buyer_id: &str, product_id: Uuid) -> Result<bool, ServiceError> {
        let variant_ids: Vec<Uuid> = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();
        if variant_ids.is_empty() {
            return Ok(false);
        }

        let order_ids: Vec<Uuid> = Order::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .select_only()
            .column(order::Column::Id)
            .into_tuple()
            .all(&*self.db)
            .await?;
        if order_ids.is_empty() {
            return Ok(false);
        }

        let purchased = OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .filter(order_item::Column::VariantId.is_in(variant_ids))
            .one(&*self.db)
            .await?;

        Ok(purchased.is_some())
    }
}
