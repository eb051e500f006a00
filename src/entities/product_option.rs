use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Option axis (e.g. "Color"); its values form one dimension of a
/// product's variant combinations
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_option_value::Entity")]
    Values,
    #[sea_orm(has_many = "super::category_option::Entity")]
    CategoryOptions,
}

impl Related<super::product_option_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Values.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_option::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::category_option::Relation::Option.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
