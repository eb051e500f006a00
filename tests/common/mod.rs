use std::sync::Arc;

use rust_decimal::Decimal;
use swiftcart_api::{
    config::AppConfig,
    db,
    events::EventSender,
    handlers::AppServices,
    services::categories::OptionWithValues,
    services::commerce::{CreateProductInput, CreateVariantInput},
    AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness backed by an in-memory SQLite database. A single pooled
/// connection keeps every task on the same database.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(swiftcart_api::events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            _event_task: event_task,
        }
    }
}

/// A seeded product with the ids tests need to exercise checkout
pub struct SeededProduct {
    pub store_id: Uuid,
    pub product_id: Uuid,
    /// Variant ids keyed by SKU
    pub variants: Vec<(String, Uuid)>,
}

/// Seeds a store selling the walkthrough product: "Classic Tee" with
/// Color x Size variants Red/S (19.99, stock 5), Red/M (19.99, stock 0)
/// and Blue/S (21.99, stock 3).
pub async fn seed_classic_tee(app: &TestApp, owner: &str) -> SeededProduct {
    let color = app
        .state
        .services
        .category
        .create_option("Color", &["Red".into(), "Blue".into()])
        .await
        .expect("failed to create Color option");
    let size = app
        .state
        .services
        .category
        .create_option("Size", &["S".into(), "M".into()])
        .await
        .expect("failed to create Size option");

    let category = app
        .state
        .services
        .category
        .create_category("Men's Clothing", None, &[color.option.id, size.option.id])
        .await
        .expect("failed to create category");

    let store = app
        .state
        .services
        .store
        .create_store(owner, "Tee Emporium")
        .await
        .expect("failed to create store");

    let variants = vec![
        CreateVariantInput {
            sku: "TEE-RED-S".to_string(),
            price: Decimal::new(1999, 2),
            stock: 5,
            option_value_ids: vec![value_id(&color, "Red"), value_id(&size, "S")],
        },
        CreateVariantInput {
            sku: "TEE-RED-M".to_string(),
            price: Decimal::new(1999, 2),
            stock: 0,
            option_value_ids: vec![value_id(&color, "Red"), value_id(&size, "M")],
        },
        CreateVariantInput {
            sku: "TEE-BLUE-S".to_string(),
            price: Decimal::new(2199, 2),
            stock: 3,
            option_value_ids: vec![value_id(&color, "Blue"), value_id(&size, "S")],
        },
    ];

    let product = app
        .state
        .services
        .product_catalog
        .create_product(CreateProductInput {
            store_id: store.id,
            category_id: category.id,
            name: "Classic Tee".to_string(),
            description: "A dependable tee.".to_string(),
            base_price: Decimal::new(1999, 2),
            is_available: true,
            image_urls: vec!["https://img.example.com/tee.jpg".to_string()],
            variants,
        })
        .await
        .expect("failed to create product");

    let details = app
        .state
        .services
        .product_catalog
        .get_product(product.id)
        .await
        .expect("failed to load seeded product");

    SeededProduct {
        store_id: store.id,
        product_id: product.id,
        variants: details
            .variants
            .into_iter()
            .map(|v| (v.variant.sku.clone(), v.variant.id))
            .collect(),
    }
}

pub fn value_id(option: &OptionWithValues, value: &str) -> Uuid {
    option
        .values
        .iter()
        .find(|v| v.value == value)
        .unwrap_or_else(|| panic!("option has no value {value}"))
        .id
}

impl SeededProduct {
    pub fn variant_id(&self, sku: &str) -> Uuid {
        self.variants
            .iter()
            .find(|(s, _)| s == sku)
            .unwrap_or_else(|| panic!("no variant with sku {sku}"))
            .1
    }
}
