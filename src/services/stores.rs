use crate::{
    entities::{store, Store, StoreModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Store (seller tenant) management
#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl StoreService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a store owned by the authenticated seller
    #[instrument(skip(self))]
    pub async fn create_store(
        &self,
        owner_user_id: &str,
        name: &str,
    ) -> Result<StoreModel, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Store name is required".to_string(),
            ));
        }

        let store_id = Uuid::new_v4();
        let row = store::ActiveModel {
            id: Set(store_id),
            name: Set(name.to_string()),
            owner_user_id: Set(owner_user_id.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        let created = row.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StoreCreated(store_id))
            .await;

        info!(%store_id, "created store");
        Ok(created)
    }

    /// The caller's store, if they have one
    pub async fn find_store_for_owner(
        &self,
        owner_user_id: &str,
    ) -> Result<Option<StoreModel>, ServiceError> {
        Ok(Store::find()
            .filter(store::Column::OwnerUserId.eq(owner_user_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn get_store(&self, store_id: Uuid) -> Result<StoreModel, ServiceError> {
        Store::find_by_id(store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", store_id)))
    }
}
