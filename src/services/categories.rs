use crate::{
    entities::{
        category, category_option, product_option, product_option_value, Category, CategoryModel,
        CategoryOption, ProductOption, ProductOptionModel, ProductOptionValue,
        ProductOptionValueModel,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Category tree and option-axis management.
///
/// Categories carry the option axes applicable to their products; the
/// seller's variant form is built from the axes of the chosen category.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

/// One option axis with its values, ordered by position
#[derive(Debug, Clone, Serialize)]
pub struct OptionWithValues {
    #[serde(flatten)]
    pub option: ProductOptionModel,
    pub values: Vec<ProductOptionValueModel>,
}

/// A category with its parent, children, and linked option axes
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTreeNode {
    pub category: CategoryModel,
    pub parent: Option<CategoryModel>,
    pub children: Vec<CategoryModel>,
    pub options: Vec<ProductOptionModel>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        option_ids: &[Uuid],
    ) -> Result<CategoryModel, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Name is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let category_id = Uuid::new_v4();
        let row = category::ActiveModel {
            id: Set(category_id),
            name: Set(name.to_string()),
            parent_id: Set(parent_id),
            created_at: Set(Utc::now()),
        };
        let created = row.insert(&txn).await?;

        for option_id in option_ids {
            let link = category_option::ActiveModel {
                category_id: Set(category_id),
                option_id: Set(*option_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let result = Category::delete_by_id(category_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        Ok(())
    }

    /// All categories with parent, children, and option links; the
    /// admin category screen renders this directly
    pub async fn list_categories(&self) -> Result<Vec<CategoryTreeNode>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut nodes = Vec::with_capacity(categories.len());
        for cat in &categories {
            let parent = match cat.parent_id {
                Some(pid) => categories.iter().find(|c| c.id == pid).cloned(),
                None => None,
            };
            let children = categories
                .iter()
                .filter(|c| c.parent_id == Some(cat.id))
                .cloned()
                .collect();

            let options = self.options_for_category(cat.id).await?;

            nodes.push(CategoryTreeNode {
                category: cat.clone(),
                parent,
                children,
                options: options.into_iter().map(|o| o.option).collect(),
            });
        }

        Ok(nodes)
    }

    /// The option axes (with values) applicable to a category; the
    /// seller UI builds its variant form from this
    pub async fn options_for_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<OptionWithValues>, ServiceError> {
        let links = CategoryOption::find()
            .filter(category_option::Column::CategoryId.eq(category_id))
            .all(&*self.db)
            .await?;
        let option_ids: Vec<Uuid> = links.into_iter().map(|l| l.option_id).collect();

        let options = ProductOption::find()
            .filter(product_option::Column::Id.is_in(option_ids))
            .order_by_asc(product_option::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        self.with_values(options).await
    }

    /// Creates an option axis together with its ordered values
    #[instrument(skip(self, values))]
    pub async fn create_option(
        &self,
        name: &str,
        values: &[String],
    ) -> Result<OptionWithValues, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Option name is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let option_id = Uuid::new_v4();
        let row = product_option::ActiveModel {
            id: Set(option_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        };
        let option = row.insert(&txn).await?;

        let mut created_values = Vec::with_capacity(values.len());
        for (position, value) in values.iter().enumerate() {
            let value_row = product_option_value::ActiveModel {
                id: Set(Uuid::new_v4()),
                option_id: Set(option_id),
                value: Set(value.clone()),
                position: Set(position as i32),
                created_at: Set(Utc::now()),
            };
            created_values.push(value_row.insert(&txn).await?);
        }

        txn.commit().await?;

        Ok(OptionWithValues {
            option,
            values: created_values,
        })
    }

    /// Every option axis with its values
    pub async fn list_options(&self) -> Result<Vec<OptionWithValues>, ServiceError> {
        let options = ProductOption::find()
            .order_by_asc(product_option::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.with_values(options).await
    }

    async fn with_values(
        &self,
        options: Vec<ProductOptionModel>,
    ) -> Result<Vec<OptionWithValues>, ServiceError> {
        let mut result = Vec::with_capacity(options.len());
        for option in options {
            let values = ProductOptionValue::find()
                .filter(product_option_value::Column::OptionId.eq(option.id))
                .order_by_asc(product_option_value::Column::Position)
                .all(&*self.db)
                .await?;
            result.push(OptionWithValues { option, values });
        }
        Ok(result)
    }
}
