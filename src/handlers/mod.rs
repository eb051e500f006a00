pub mod categories;
pub mod checkout;
pub mod common;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod stores;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<crate::services::commerce::ProductCatalogService>,
    pub checkout: Arc<crate::services::commerce::CheckoutService>,
    pub customer: Arc<crate::services::commerce::CustomerService>,
    pub order: Arc<crate::services::orders::OrderService>,
    pub store: Arc<crate::services::stores::StoreService>,
    pub category: Arc<crate::services::categories::CategoryService>,
    pub review: Arc<crate::services::reviews::ReviewService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let product_catalog = Arc::new(crate::services::commerce::ProductCatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let customer = Arc::new(crate::services::commerce::CustomerService::new(
            db_pool.clone(),
        ));
        let checkout = Arc::new(crate::services::commerce::CheckoutService::new(
            db_pool.clone(),
            event_sender.clone(),
            customer.clone(),
        ));
        let order = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let store = Arc::new(crate::services::stores::StoreService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let category = Arc::new(crate::services::categories::CategoryService::new(
            db_pool.clone(),
        ));
        let review = Arc::new(crate::services::reviews::ReviewService::new(
            db_pool,
            event_sender,
        ));

        Self {
            product_catalog,
            checkout,
            customer,
            order,
            store,
            category,
            review,
        }
    }
}
