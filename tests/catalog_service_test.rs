mod common;

use common::{seed_classic_tee, value_id, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use swiftcart_api::{
    errors::ServiceError,
    services::commerce::{
        BuyerIdentity, CreateProductInput, CreateVariantInput, ShippingAddressInput,
        UpdateProductInput,
    },
};

fn selection(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn product_details_carry_ordered_variant_attributes() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let details = app
        .state
        .services
        .product_catalog
        .get_product(seeded.product_id)
        .await
        .expect("product should load");

    assert_eq!(details.product.name, "Classic Tee");
    assert_eq!(details.images.len(), 1);
    assert_eq!(details.variants.len(), 3);

    let red_s = details
        .variants
        .iter()
        .find(|v| v.variant.sku == "TEE-RED-S")
        .expect("Red/S variant present");
    assert_eq!(
        red_s.attributes,
        vec![
            ("Color".to_string(), "Red".to_string()),
            ("Size".to_string(), "S".to_string()),
        ]
    );
}

#[tokio::test]
async fn selection_resolves_through_the_persisted_catalog() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    // Complete selection hits the unique matching variant
    let resolved = app
        .state
        .services
        .product_catalog
        .resolve_selection(seeded.product_id, &selection(&[("Color", "Red"), ("Size", "S")]))
        .await
        .expect("resolution should not error")
        .expect("Red/S is offered");
    assert_eq!(resolved.sku, "TEE-RED-S");
    assert_eq!(resolved.price, dec!(19.99));
    assert!(resolved.in_stock);
    assert_eq!(resolved.label, "Color: Red, Size: S");

    // Out-of-stock combination resolves but is not purchasable
    let resolved = app
        .state
        .services
        .product_catalog
        .resolve_selection(seeded.product_id, &selection(&[("Color", "Red"), ("Size", "M")]))
        .await
        .unwrap()
        .expect("Red/M is offered");
    assert!(!resolved.in_stock);

    // Partial selection has no determinate match
    let resolved = app
        .state
        .services
        .product_catalog
        .resolve_selection(seeded.product_id, &selection(&[("Color", "Blue")]))
        .await
        .unwrap();
    assert!(resolved.is_none());

    // Unoffered combination has no match either
    let resolved = app
        .state
        .services
        .product_catalog
        .resolve_selection(seeded.product_id, &selection(&[("Color", "Blue"), ("Size", "M")]))
        .await
        .unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn default_selection_picks_first_value_per_axis() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let seeded_selection = app
        .state
        .services
        .product_catalog
        .default_selection(seeded.product_id)
        .await
        .unwrap();

    let resolved = app
        .state
        .services
        .product_catalog
        .resolve_selection(seeded.product_id, &seeded_selection)
        .await
        .unwrap()
        .expect("default selection always resolves when variants exist");
    assert_eq!(resolved.sku, "TEE-RED-S");
}

#[tokio::test]
async fn variant_with_two_values_on_one_axis_is_rejected() {
    let app = TestApp::new().await;

    let color = app
        .state
        .services
        .category
        .create_option("Color", &["Red".into(), "Blue".into()])
        .await
        .unwrap();
    let category = app
        .state
        .services
        .category
        .create_category("Headphones", None, &[color.option.id])
        .await
        .unwrap();
    let store = app
        .state
        .services
        .store
        .create_store("seller_1", "Audio Shack")
        .await
        .unwrap();

    let result = app
        .state
        .services
        .product_catalog
        .create_product(CreateProductInput {
            store_id: store.id,
            category_id: category.id,
            name: "Over-Ears".to_string(),
            description: String::new(),
            base_price: dec!(49.99),
            is_available: true,
            image_urls: vec![],
            variants: vec![CreateVariantInput {
                sku: "OE-1".to_string(),
                price: dec!(49.99),
                stock: 10,
                // Two Colors on one variant violates the one-value-per-axis rule
                option_value_ids: vec![value_id(&color, "Red"), value_id(&color, "Blue")],
            }],
        })
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn updating_variants_replaces_the_previous_set() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let options = app
        .state
        .services
        .category
        .list_options()
        .await
        .unwrap();
    let color = options
        .iter()
        .find(|o| o.option.name == "Color")
        .expect("Color axis exists");

    app.state
        .services
        .product_catalog
        .update_product(
            seeded.product_id,
            UpdateProductInput {
                name: Some("Classic Tee v2".to_string()),
                variants: Some(vec![CreateVariantInput {
                    sku: "TEE2-RED".to_string(),
                    price: dec!(24.99),
                    stock: 7,
                    option_value_ids: vec![value_id(color, "Red")],
                }]),
                ..Default::default()
            },
        )
        .await
        .expect("update should succeed");

    let details = app
        .state
        .services
        .product_catalog
        .get_product(seeded.product_id)
        .await
        .unwrap();
    assert_eq!(details.product.name, "Classic Tee v2");
    assert_eq!(details.variants.len(), 1);
    assert_eq!(details.variants[0].variant.sku, "TEE2-RED");
    assert_eq!(details.variants[0].variant.stock, 7);
}

#[tokio::test]
async fn availability_toggle_flips_the_flag() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let now_available = app
        .state
        .services
        .product_catalog
        .toggle_availability(seeded.product_id)
        .await
        .unwrap();
    assert!(!now_available);

    let (listings, total) = app
        .state
        .services
        .product_catalog
        .list_available_products(1, 20)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(listings.is_empty());
}

#[tokio::test]
async fn storefront_listing_derives_price_range_from_variants() {
    let app = TestApp::new().await;
    seed_classic_tee(&app, "seller_1").await;

    let (listings, total) = app
        .state
        .services
        .product_catalog
        .list_available_products(1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(listings[0].min_price, dec!(19.99));
    assert_eq!(listings[0].max_price, dec!(21.99));
    assert_eq!(
        listings[0].thumbnail_url.as_deref(),
        Some("https://img.example.com/tee.jpg")
    );
}

#[tokio::test]
async fn reviews_are_gated_on_purchase_and_upsert_per_buyer() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    // No purchase yet: rejected
    let result = app
        .state
        .services
        .review
        .submit_review("buyer_1", seeded.product_id, 5.0, None)
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    // Buy the product, then review it
    app.state
        .services
        .checkout
        .place_order(
            &BuyerIdentity {
                external_id: "buyer_1".to_string(),
                name: "Test Buyer".to_string(),
                email: "buyer@example.com".to_string(),
            },
            ShippingAddressInput {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: None,
                postal_code: "62701".to_string(),
                country: "US".to_string(),
            },
            json!([{"variant_id": seeded.variant_id("TEE-RED-S"), "quantity": 1}]),
        )
        .await
        .expect("checkout should succeed");

    let review = app
        .state
        .services
        .review
        .submit_review("buyer_1", seeded.product_id, 4.0, Some("Good tee".into()))
        .await
        .expect("review should be accepted after purchase");
    assert_eq!(review.rating, 4);

    // Re-submitting updates the same row
    let review = app
        .state
        .services
        .review
        .submit_review("buyer_1", seeded.product_id, 5.0, None)
        .await
        .unwrap();
    assert_eq!(review.rating, 5);

    let reviews = app
        .state
        .services
        .review
        .list_for_product(seeded.product_id)
        .await
        .unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].buyer_name, "Test Buyer");

    let average = app
        .state
        .services
        .review
        .average_rating(seeded.product_id)
        .await
        .unwrap();
    assert_eq!(average, Some(5.0));

    // An out-of-range rating is rejected outright
    let result = app
        .state
        .services
        .review
        .submit_review("buyer_1", seeded.product_id, 6.0, None)
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn seller_dashboard_aggregates_store_orders() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;
    let red_s = seeded.variant_id("TEE-RED-S");

    for buyer_id in ["buyer_1", "buyer_2"] {
        app.state
            .services
            .checkout
            .place_order(
                &BuyerIdentity {
                    external_id: buyer_id.to_string(),
                    name: "Buyer".to_string(),
                    email: format!("{buyer_id}@example.com"),
                },
                ShippingAddressInput {
                    street: "1 Main St".to_string(),
                    city: "Springfield".to_string(),
                    state: None,
                    postal_code: "62701".to_string(),
                    country: "US".to_string(),
                },
                json!([{"variant_id": red_s, "quantity": 1}]),
            )
            .await
            .expect("checkout should succeed");
    }

    let summary = app
        .state
        .services
        .order
        .store_dashboard(seeded.store_id)
        .await
        .unwrap();

    assert_eq!(summary.total_orders, 2);
    assert_eq!(summary.total_products, 1);
    assert_eq!(summary.total_customers, 2);
    assert_eq!(summary.total_revenue, dec!(39.98));
    assert_eq!(summary.sales_by_day.len(), 1);
    assert_eq!(summary.sales_by_day[0].sales, dec!(39.98));
    assert_eq!(summary.recent_orders.len(), 2);

    let (orders, total) = app
        .state
        .services
        .order
        .list_orders_for_store(seeded.store_id, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].items.len(), 1);

    let mine = app
        .state
        .services
        .order
        .list_orders_for_buyer("buyer_1")
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn order_status_can_be_advanced() {
    let app = TestApp::new().await;
    let seeded = seed_classic_tee(&app, "seller_1").await;

    let placed = app
        .state
        .services
        .checkout
        .place_order(
            &BuyerIdentity {
                external_id: "buyer_1".to_string(),
                name: "Buyer".to_string(),
                email: "buyer@example.com".to_string(),
            },
            ShippingAddressInput {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: None,
                postal_code: "62701".to_string(),
                country: "US".to_string(),
            },
            json!([{"variant_id": seeded.variant_id("TEE-RED-S"), "quantity": 1}]),
        )
        .await
        .unwrap();

    let updated = app
        .state
        .services
        .order
        .update_status(placed.order_id, "shipped")
        .await
        .unwrap();
    assert_eq!(updated.status, "shipped");

    let result = app
        .state
        .services
        .order
        .update_status(placed.order_id, "  ")
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}
