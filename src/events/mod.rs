use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Domain events emitted by the services. Delivery is fire-and-forget;
/// a failed send never fails the operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderPlaced {
        order_id: Uuid,
        store_id: Uuid,
        price_paid: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    StockDecremented {
        variant_id: Uuid,
        quantity: i32,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Tenancy events
    StoreCreated(Uuid),

    // Review events
    ReviewSubmitted {
        product_id: Uuid,
        rating: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing the failure to the caller
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event and logs on failure instead of propagating it
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Dropped domain event: {}", e);
        }
    }
}

/// Consumes events off the channel and logs them. The surrounding
/// application has no other event consumers; this keeps an audit trail
/// in the structured logs.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                store_id,
                price_paid,
            } => {
                info!(
                    order_id = %order_id,
                    store_id = %store_id,
                    price_paid = %price_paid,
                    "order placed"
                );
            }
            Event::StockDecremented {
                variant_id,
                quantity,
            } => {
                info!(variant_id = %variant_id, quantity, "stock decremented");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
