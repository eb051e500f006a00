use crate::{
    entities::{order, order_item, product_variant, Product, ProductVariant},
    errors::CheckoutError,
    events::{Event, EventSender},
    services::commerce::customer_service::CustomerService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Checkout service: converts an untrusted client cart snapshot plus
/// shipping details into a durable, financially consistent order.
///
/// Prices are always re-derived from the catalog; the snapshot's cached
/// prices are never read. Stock is re-checked and decremented inside one
/// transaction so concurrent checkouts can never drive it negative.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    customers: Arc<CustomerService>,
}

/// The authenticated buyer placing the order, as reported by the hosted
/// auth provider
#[derive(Debug, Clone)]
pub struct BuyerIdentity {
    pub external_id: String,
    pub name: String,
    pub email: String,
}

/// Shipping fields as submitted; sanitized during checkout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShippingAddressInput {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// One decoded cart line. The client also caches price and attribute
/// snapshots for display; those fields are deliberately not modeled
/// here, so tampered values cannot reach the total.
#[derive(Debug, Deserialize)]
struct CartLineInput {
    #[serde(alias = "productVariantId")]
    variant_id: Uuid,
    quantity: f64,
}

/// Result of a committed checkout
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub store_id: Uuid,
    pub price_paid: Decimal,
    pub item_count: usize,
}

struct SanitizedAddress {
    street: String,
    city: String,
    state: Option<String>,
    postal_code: String,
    country: String,
}

struct PricedLine {
    variant_id: Uuid,
    sku: String,
    quantity: i32,
    unit_price: Decimal,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        customers: Arc<CustomerService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            customers,
        }
    }

    /// Places an order from a cart snapshot.
    ///
    /// The flow is linear with no retries: any precondition failure
    /// aborts the whole operation with its distinct error kind. The
    /// buyer/address upsert commits before the order transaction and
    /// legitimately survives a later failure; order, order items, and
    /// stock only ever change together.
    #[instrument(skip(self, shipping, cart_snapshot), fields(buyer = %buyer.external_id))]
    pub async fn place_order(
        &self,
        buyer: &BuyerIdentity,
        shipping: ShippingAddressInput,
        cart_snapshot: serde_json::Value,
    ) -> Result<PlacedOrder, CheckoutError> {
        // Parse and sanitize input
        let address = sanitize_address(shipping)?;
        let lines = decode_cart_lines(cart_snapshot)?;

        // Re-fetch authoritative variant data
        let requested_ids: HashSet<Uuid> = lines.iter().map(|l| l.variant_id).collect();
        let variants = ProductVariant::find()
            .filter(product_variant::Column::Id.is_in(requested_ids.iter().copied()))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        if variants.len() < requested_ids.len() {
            return Err(CheckoutError::ItemsNoLongerExist);
        }
        if variants.iter().any(|(_, product)| product.is_none()) {
            // A variant without its owning product is as stale as a
            // missing one
            return Err(CheckoutError::ItemsNoLongerExist);
        }

        // Single-store invariant: one order belongs to one seller
        let store_ids: HashSet<Uuid> = variants
            .iter()
            .filter_map(|(_, product)| product.as_ref().map(|p| p.store_id))
            .collect();
        if store_ids.len() != 1 {
            return Err(CheckoutError::MixedStoreCart);
        }
        let store_id = *store_ids.iter().next().expect("exactly one store id");

        // Price and total computation from authoritative prices only
        let priced = price_lines(&lines, &variants);
        let price_paid: Decimal = priced
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        // Buyer and default address upsert. Committed before the order
        // transaction; may persist even if checkout fails afterwards.
        self.customers
            .upsert_buyer(&buyer.external_id, &buyer.name, &buyer.email)
            .await
            .map_err(CheckoutError::Persistence)?;
        self.customers
            .upsert_default_address(
                &buyer.external_id,
                &address.street,
                &address.city,
                address.state.as_deref(),
                &address.postal_code,
                &address.country,
            )
            .await
            .map_err(CheckoutError::Persistence)?;

        // Atomic order creation: stock re-check, order + item inserts,
        // and guarded decrements all commit or none do
        let txn = self.db.begin().await?;

        // Catalog state can change between the read above and this
        // transaction; the stock check must happen inside the boundary
        for line in &priced {
            let current = ProductVariant::find_by_id(line.variant_id)
                .one(&txn)
                .await?
                .ok_or(CheckoutError::ItemsNoLongerExist)?;
            if current.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock(current.sku));
            }
        }

        let order_id = Uuid::new_v4();
        let order_row = order::ActiveModel {
            id: Set(order_id),
            buyer_id: Set(buyer.external_id.clone()),
            store_id: Set(store_id),
            price_paid: Set(price_paid),
            platform_fee: Set(Decimal::ZERO),
            shipping_street: Set(address.street),
            shipping_city: Set(address.city),
            shipping_state: Set(address.state),
            shipping_postal_code: Set(address.postal_code),
            shipping_country: Set(address.country),
            status: Set(order::STATUS_PENDING.to_string()),
            created_at: Set(Utc::now()),
        };
        order_row.insert(&txn).await?;

        for line in &priced {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                variant_id: Set(line.variant_id),
                quantity: Set(line.quantity),
                // Price at time of purchase: copied, never referenced live
                price: Set(line.unit_price),
            };
            item.insert(&txn).await?;
        }

        for line in &priced {
            // Conditional decrement: only applies while stock still
            // covers the quantity, so two concurrent checkouts cannot
            // both take the last unit. Zero rows affected aborts the
            // whole transaction.
            let result = ProductVariant::update_many()
                .col_expr(
                    product_variant::Column::Stock,
                    Expr::col(product_variant::Column::Stock).sub(line.quantity),
                )
                .col_expr(product_variant::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product_variant::Column::Id.eq(line.variant_id))
                .filter(product_variant::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                warn!(
                    variant_id = %line.variant_id,
                    "stock changed during checkout, aborting"
                );
                return Err(CheckoutError::InsufficientStock(line.sku.clone()));
            }
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id,
                store_id,
                price_paid,
            })
            .await;
        for line in &priced {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    variant_id: line.variant_id,
                    quantity: line.quantity,
                })
                .await;
        }

        info!(%order_id, %store_id, %price_paid, "checkout completed");
        Ok(PlacedOrder {
            order_id,
            store_id,
            price_paid,
            item_count: priced.len(),
        })
    }
}

/// Trims shipping fields and rejects any missing required one. State is
/// the only optional field.
fn sanitize_address(input: ShippingAddressInput) -> Result<SanitizedAddress, CheckoutError> {
    let required = |value: &str, field: &str| -> Result<String, CheckoutError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(CheckoutError::InvalidAddress(field.to_string()))
        } else {
            Ok(trimmed.to_string())
        }
    };

    Ok(SanitizedAddress {
        street: required(&input.street, "street")?,
        city: required(&input.city, "city")?,
        state: input
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        postal_code: required(&input.postal_code, "postal_code")?,
        country: required(&input.country, "country")?,
    })
}

/// Decodes the serialized cart snapshot and drops lines without a
/// positive quantity. An undecodable payload and an empty cart are
/// distinct failures.
fn decode_cart_lines(snapshot: serde_json::Value) -> Result<Vec<CartLineInput>, CheckoutError> {
    let lines: Vec<CartLineInput> = serde_json::from_value(snapshot)
        .map_err(|e| CheckoutError::InvalidCartPayload(e.to_string()))?;

    let lines: Vec<CartLineInput> = lines
        .into_iter()
        .filter(|line| line.quantity.is_finite() && line.quantity > 0.0)
        .collect();

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(lines)
}

/// Clamps each quantity to a positive integer and attaches the
/// authoritative unit price
fn price_lines(
    lines: &[CartLineInput],
    variants: &[(product_variant::Model, Option<crate::entities::ProductModel>)],
) -> Vec<PricedLine> {
    lines
        .iter()
        .filter_map(|line| {
            let (variant, _) = variants.iter().find(|(v, _)| v.id == line.variant_id)?;
            let quantity = (line.quantity.floor() as i64).max(1) as i32;
            Some(PricedLine {
                variant_id: variant.id,
                sku: variant.sku.clone(),
                quantity,
                unit_price: variant.price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_requires_all_fields_but_state() {
        let base = ShippingAddressInput {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: None,
            postal_code: "12345".into(),
            country: "US".into(),
        };
        assert!(sanitize_address(base.clone()).is_ok());

        let mut missing_city = base.clone();
        missing_city.city = "   ".into();
        assert!(matches!(
            sanitize_address(missing_city),
            Err(CheckoutError::InvalidAddress(field)) if field == "city"
        ));

        let mut blank_state = base;
        blank_state.state = Some("  ".into());
        let sanitized = sanitize_address(blank_state).unwrap();
        assert!(sanitized.state.is_none());
    }

    #[test]
    fn malformed_snapshot_is_invalid_payload() {
        let result = decode_cart_lines(json!({"not": "a list"}));
        assert!(matches!(result, Err(CheckoutError::InvalidCartPayload(_))));
    }

    #[test]
    fn non_positive_quantities_are_filtered_then_empty_cart() {
        let snapshot = json!([
            {"variant_id": Uuid::new_v4(), "quantity": 0.0},
            {"variant_id": Uuid::new_v4(), "quantity": -2.0},
        ]);
        assert!(matches!(
            decode_cart_lines(snapshot),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn client_field_names_are_accepted() {
        let id = Uuid::new_v4();
        let snapshot = json!([
            {"productVariantId": id, "quantity": 2, "price": 0.01, "productName": "Tee"}
        ]);
        let lines = decode_cart_lines(snapshot).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].variant_id, id);
    }
}
