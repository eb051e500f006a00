mod common;

use common::{seed_classic_tee, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use swiftcart_api::{
    entities::{buyer_address, order, order_item, BuyerAddress, Order, OrderItem, ProductVariant},
    errors::CheckoutError,
    services::commerce::{BuyerIdentity, ShippingAddressInput},
};
use uuid::Uuid;

fn buyer(external_id: &str) -> BuyerIdentity {
    BuyerIdentity {
        external_id: external_id.to_string(),
        name: "Test Buyer".to_string(),
        email: "buyer@example.com".to_string(),
    }
}

fn shipping() -> ShippingAddressInput {
    ShippingAddressInput {
        street: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: Some("IL".to_string()),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

#[tokio::test]
async fn classic_tee_checkout_end_to_end() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": red_s, "quantity": 2}]),
        )
        .await
        .expect("checkout should succeed");

    assert_eq!(placed.store_id, seeded.store_id);
    assert_eq!(placed.price_paid, dec!(39.98));
    assert_eq!(placed.item_count, 1);

    // Stock decremented 5 -> 3
    let variant = ProductVariant::find_by_id(red_s)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.stock, 3);

    // Order and item rows exist with the copied unit price
    let order_row = Order::find_by_id(placed.order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("order persisted");
    assert_eq!(order_row.buyer_id, "buyer_1");
    assert_eq!(order_row.price_paid, dec!(39.98));
    assert_eq!(order_row.status, order::STATUS_PENDING);

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(placed.order_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].price, dec!(19.99));
}

#[tokio::test]
async fn tampered_client_price_is_ignored() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let blue_s = seeded.variant_id("TEE-BLUE-S");

    // The snapshot claims a unit price of one cent; the catalog says 21.99
    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": blue_s, "quantity": 1, "price": 0.01}]),
        )
        .await
        .expect("checkout should succeed");

    assert_eq!(placed.price_paid, dec!(21.99));
}

#[tokio::test]
async fn mixed_store_cart_is_rejected_without_creating_an_order() {
    let app = TestApp::new().await;
    let first = seed_classic_tee(&app, "seller_1").await;
    let second = seed_classic_tee(&app, "seller_2").await;

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([
                {"variant_id": first.variant_id("TEE-RED-S"), "quantity": 1},
                {"variant_id": second.variant_id("TEE-RED-S"), "quantity": 1},
            ]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::MixedStoreCart)));

    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn cart_with_only_non_positive_quantities_is_empty() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": red_s, "quantity": 0}]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
}

#[tokio::test]
async fn malformed_snapshot_is_invalid_cart_payload() {
    let app = TestApp::new().await;
    seed_classic_tee(&app, "seller_1").await;

    let result = app
        .state
        .services
        .checkout
        .place_order(&buyer("buyer_1"), shipping(), json!("not a cart"))
        .await;

    assert!(matches!(result, Err(CheckoutError::InvalidCartPayload(_))));
}

#[tokio::test]
async fn stale_variant_id_fails_items_no_longer_exist() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([
                {"variant_id": seeded.variant_id("TEE-RED-S"), "quantity": 1},
                {"variant_id": Uuid::new_v4(), "quantity": 1},
            ]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::ItemsNoLongerExist)));
}

#[tokio::test]
async fn missing_address_field_fails_before_any_write() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let mut bad_shipping = shipping();
    bad_shipping.postal_code = "   ".to_string();

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            bad_shipping,
            json!([{"variant_id": seeded.variant_id("TEE-RED-S"), "quantity": 1}]),
        )
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::InvalidAddress(field)) if field == "postal_code"
    ));
}

#[tokio::test]
async fn ordering_more_than_stock_fails_and_leaves_stock_untouched() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let blue_s = seeded.variant_id("TEE-BLUE-S");

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": blue_s, "quantity": 4}]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::InsufficientStock(_))));

    let variant = ProductVariant::find_by_id(blue_s)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.stock, 3);

    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn out_of_stock_variant_cannot_be_ordered() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let result = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": seeded.variant_id("TEE-RED-M"), "quantity": 1}]),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::InsufficientStock(_))));
}

#[tokio::test]
async fn concurrent_checkouts_cannot_oversell_the_last_unit() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let blue_s = seeded.variant_id("TEE-BLUE-S");

    // Drain the variant down to a single unit
    app.state
        .services
        .checkout
        .place_order(
            &buyer("buyer_0"),
            shipping(),
            json!([{"variant_id": blue_s, "quantity": 2}]),
        )
        .await
        .expect("setup checkout should succeed");

    let checkout = &app.state.services.checkout;
    let snapshot = json!([{"variant_id": blue_s, "quantity": 1}]);

    let buyer_1 = buyer("buyer_1");
    let buyer_2 = buyer("buyer_2");
    let (first, second) = tokio::join!(
        checkout.place_order(&buyer_1, shipping(), snapshot.clone()),
        checkout.place_order(&buyer_2, shipping(), snapshot),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent checkout may win");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(CheckoutError::InsufficientStock(_))));

    // Never negative: the last unit was sold exactly once
    let variant = ProductVariant::find_by_id(blue_s)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.stock, 0);
}

#[tokio::test]
async fn fractional_quantities_are_clamped_to_positive_integers() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    // 2.7 floors to 2; 0.5 is kept by the filter and clamps up to 1
    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([
                {"variant_id": red_s, "quantity": 2.7},
            ]),
        )
        .await
        .expect("checkout should succeed");

    assert_eq!(placed.price_paid, dec!(39.98));

    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([
                {"variant_id": red_s, "quantity": 0.5},
            ]),
        )
        .await
        .expect("checkout should succeed");

    assert_eq!(placed.price_paid, dec!(19.99));
}

#[tokio::test]
async fn repeated_checkouts_overwrite_the_single_default_address() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    app.state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": red_s, "quantity": 1}]),
        )
        .await
        .expect("first checkout should succeed");

    let mut moved = shipping();
    moved.street = "99 Elm Ave".to_string();
    moved.city = "Shelbyville".to_string();
    moved.state = None;

    app.state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            moved,
            json!([{"variant_id": red_s, "quantity": 1}]),
        )
        .await
        .expect("second checkout should succeed");

    let addresses = BuyerAddress::find()
        .filter(buyer_address::Column::BuyerId.eq("buyer_1"))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1, "at most one saved address per buyer");
    assert_eq!(addresses[0].street, "99 Elm Ave");
    assert_eq!(addresses[0].city, "Shelbyville");
    assert_eq!(addresses[0].state, None);
}

#[tokio::test]
async fn order_snapshot_price_survives_catalog_price_change() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &buyer("buyer_1"),
            shipping(),
            json!([{"variant_id": red_s, "quantity": 1}]),
        )
        .await
        .expect("checkout should succeed");

    // Seller re-prices the catalog afterwards
    use sea_orm::{ActiveModelTrait, Set};
    let variant = ProductVariant::find_by_id(red_s)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut update: swiftcart_api::entities::product_variant::ActiveModel = variant.into();
    update.price = Set(dec!(29.99));
    update.update(&*app.state.db).await.unwrap();

    // The historical order item still carries the purchase-time price
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(placed.order_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(items[0].price, dec!(19.99));
}
