use crate::{
    entities::{order, order_item, product, Order, OrderItem, OrderModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order queries for buyers and sellers, plus the store dashboard
/// aggregation. Orders are created only by the checkout service; this
/// service reads them and advances the status field.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// An order with its line items
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<crate::entities::OrderItemModel>,
}

/// Revenue for one calendar day
#[derive(Debug, Clone, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: Decimal,
}

/// Aggregates rendered on the seller dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    pub sales_by_day: Vec<DailySales>,
    pub recent_orders: Vec<OrderModel>,
}

const RECENT_ORDER_LIMIT: usize = 5;

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// A buyer's order history, newest first
    pub async fn list_orders_for_buyer(
        &self,
        buyer_id: &str,
    ) -> Result<Vec<OrderWithItems>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        self.attach_items(orders).await
    }

    /// One store's orders, newest first, paginated
    pub async fn list_orders_for_store(
        &self,
        store_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderWithItems>, u64), ServiceError> {
        let paginator = Order::find()
            .filter(order::Column::StoreId.eq(store_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        let with_items = self.attach_items(orders).await?;
        Ok((with_items, total))
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Advances the order's single status field. No state machine is
    /// enforced beyond requiring a non-empty value.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: &str,
    ) -> Result<OrderModel, ServiceError> {
        let new_status = new_status.trim();
        if new_status.is_empty() {
            return Err(ServiceError::ValidationError(
                "Status is required".to_string(),
            ));
        }

        let existing = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = existing.status.clone();
        let mut update: order::ActiveModel = existing.into();
        update.status = Set(new_status.to_string());
        let updated = update.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: new_status.to_string(),
            })
            .await;

        info!(%order_id, new_status, "order status updated");
        Ok(updated)
    }

    /// All-time aggregates plus a per-day sales series for the store
    /// dashboard
    pub async fn store_dashboard(&self, store_id: Uuid) -> Result<DashboardSummary, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::StoreId.eq(store_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let total_products = Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .count(&*self.db)
            .await?;

        let total_revenue: Decimal = orders.iter().map(|o| o.price_paid).sum();
        let total_orders = orders.len() as u64;
        let total_customers = orders
            .iter()
            .map(|o| o.buyer_id.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;

        let mut sales_by_day: Vec<DailySales> = Vec::new();
        for order in &orders {
            let date = order.created_at.date_naive();
            match sales_by_day.iter_mut().find(|d| d.date == date) {
                Some(day) => day.sales += order.price_paid,
                None => sales_by_day.push(DailySales {
                    date,
                    sales: order.price_paid,
                }),
            }
        }
        sales_by_day.sort_by_key(|d| d.date);

        let recent_orders = orders.into_iter().take(RECENT_ORDER_LIMIT).collect();

        Ok(DashboardSummary {
            total_revenue,
            total_orders,
            total_products,
            total_customers,
            sales_by_day,
            recent_orders,
        })
    }

    async fn attach_items(
        &self,
        orders: Vec<OrderModel>,
    ) -> Result<Vec<OrderWithItems>, ServiceError> {
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = OrderItem::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .all(&*self.db)
                .await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }
}
