use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order entity. Created once, atomically, during checkout; immutable
/// afterwards except for `status`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub buyer_id: String,
    pub store_id: Uuid,
    /// Total charged, computed server-side from authoritative variant
    /// prices at purchase time
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price_paid: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub platform_fee: Decimal,
    pub shipping_street: String,
    pub shipping_city: String,
    #[sea_orm(nullable)]
    pub shipping_state: Option<String>,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buyer::Entity",
        from = "Column::BuyerId",
        to = "super::buyer::Column::Id"
    )]
    Buyer,
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::buyer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buyer.def()
    }
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Initial status of a freshly placed order
pub const STATUS_PENDING: &str = "pending";
