use crate::{
    entities::{buyer, buyer_address, Buyer, BuyerAddress, BuyerAddressModel, BuyerModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Buyer and address management.
///
/// Buyers are keyed by the hosted auth provider's external id, so the
/// upsert is idempotent across checkouts. Each buyer holds at most one
/// default shipping address; repeated checkouts overwrite it.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates the buyer row if absent, otherwise refreshes the profile
    /// fields from the auth provider
    #[instrument(skip(self))]
    pub async fn upsert_buyer(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
    ) -> Result<BuyerModel, DbErr> {
        match Buyer::find_by_id(external_id).one(&*self.db).await? {
            Some(existing) => {
                let mut update: buyer::ActiveModel = existing.into();
                update.name = Set(name.to_string());
                update.email = Set(email.to_string());
                update.updated_at = Set(Utc::now());
                update.update(&*self.db).await
            }
            None => {
                let row = buyer::ActiveModel {
                    id: Set(external_id.to_string()),
                    name: Set(name.to_string()),
                    email: Set(email.to_string()),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                };
                row.insert(&*self.db).await
            }
        }
    }

    /// Updates the buyer's single default address, creating it on first
    /// use
    #[instrument(skip(self, street, city, state, postal_code, country))]
    pub async fn upsert_default_address(
        &self,
        buyer_id: &str,
        street: &str,
        city: &str,
        state: Option<&str>,
        postal_code: &str,
        country: &str,
    ) -> Result<BuyerAddressModel, DbErr> {
        let existing = BuyerAddress::find()
            .filter(buyer_address::Column::BuyerId.eq(buyer_id))
            .one(&*self.db)
            .await?;

        match existing {
            Some(address) => {
                let mut update: buyer_address::ActiveModel = address.into();
                update.street = Set(street.to_string());
                update.city = Set(city.to_string());
                update.state = Set(state.map(str::to_string));
                update.postal_code = Set(postal_code.to_string());
                update.country = Set(country.to_string());
                update.updated_at = Set(Utc::now());
                update.update(&*self.db).await
            }
            None => {
                let row = buyer_address::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    buyer_id: Set(buyer_id.to_string()),
                    street: Set(street.to_string()),
                    city: Set(city.to_string()),
                    state: Set(state.map(str::to_string)),
                    postal_code: Set(postal_code.to_string()),
                    country: Set(country.to_string()),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                };
                row.insert(&*self.db).await
            }
        }
    }

    /// The buyer's saved default address, if any
    pub async fn default_address(
        &self,
        buyer_id: &str,
    ) -> Result<Option<BuyerAddressModel>, ServiceError> {
        Ok(BuyerAddress::find()
            .filter(buyer_address::Column::BuyerId.eq(buyer_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn get_buyer(&self, external_id: &str) -> Result<Option<BuyerModel>, ServiceError> {
        Ok(Buyer::find_by_id(external_id).one(&*self.db).await?)
    }
}
