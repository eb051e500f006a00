use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One concrete value along an option axis (e.g. "Red"). `position`
/// preserves the axis's insertion order for default selection.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_option_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub option_id: Uuid,
    pub value: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_option::Entity",
        from = "Column::OptionId",
        to = "super::product_option::Column::Id"
    )]
    Option,
    #[sea_orm(has_many = "super::variant_option_value::Entity")]
    VariantLinks,
}

impl Related<super::product_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Option.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        super::variant_option_value::Relation::Variant.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::variant_option_value::Relation::OptionValue.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
