use crate::{
    entities::{
        product, product_image, product_option, product_option_value, product_variant,
        variant_option_value, Product, ProductImage, ProductImageModel, ProductModel,
        ProductOption, ProductOptionValue, ProductVariant, ProductVariantModel,
        VariantOptionValue,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::variant_resolver::{self, ResolvableVariant, VariantResolveError},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Seller-facing catalog management plus the storefront read queries.
///
/// Product writes that touch children (images, variants) are
/// replace-style and transactional: the seller form submits the full
/// desired state and the previous children are swapped out atomically.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a variant as part of a product write
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateVariantInput {
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    /// One option value per distinct option axis
    pub option_value_ids: Vec<Uuid>,
}

/// Input for creating a product with its images and variants
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub store_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub base_price: Decimal,
    pub is_available: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub variants: Vec<CreateVariantInput>,
}

/// Input for updating a product. `None` children are left untouched;
/// `Some` children replace the existing set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub base_price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub image_urls: Option<Vec<String>>,
    pub variants: Option<Vec<CreateVariantInput>>,
}

/// A variant with its option attributes, ready for display or
/// resolution
#[derive(Debug, Clone, Serialize)]
pub struct VariantDetails {
    #[serde(flatten)]
    pub variant: ProductVariantModel,
    /// `(option name, option value)` pairs in axis order
    pub attributes: Vec<(String, String)>,
}

/// A product with all the data the storefront product page needs
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetails {
    pub product: ProductModel,
    pub images: Vec<ProductImageModel>,
    pub variants: Vec<VariantDetails>,
}

/// Storefront listing row with a price range derived from variants
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub product: ProductModel,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub thumbnail_url: Option<String>,
}

/// Outcome of resolving a selection against a product's variants
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSelection {
    pub variant_id: Uuid,
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub label: String,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a product together with its images and variants in one
    /// transaction
    #[instrument(skip(self, input), fields(store_id = %input.store_id))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product_id = Uuid::new_v4();
        let row = product::ActiveModel {
            id: Set(product_id),
            store_id: Set(input.store_id),
            category_id: Set(input.category_id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            base_price: Set(input.base_price),
            is_available: Set(input.is_available),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        let created = row.insert(&txn).await?;

        insert_images(&txn, product_id, &input.image_urls).await?;
        insert_variants(&txn, product_id, &input.variants).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!(%product_id, "created product");
        Ok(created)
    }

    /// Applies field updates and, where provided, replaces the image and
    /// variant sets
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let txn = self.db.begin().await?;

        let mut update: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            update.name = Set(name);
        }
        if let Some(description) = input.description {
            update.description = Set(description);
        }
        if let Some(category_id) = input.category_id {
            update.category_id = Set(category_id);
        }
        if let Some(base_price) = input.base_price {
            update.base_price = Set(base_price);
        }
        if let Some(is_available) = input.is_available {
            update.is_available = Set(is_available);
        }
        update.updated_at = Set(Utc::now());
        let updated = update.update(&txn).await?;

        if let Some(image_urls) = &input.image_urls {
            ProductImage::delete_many()
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?;
            insert_images(&txn, product_id, image_urls).await?;
        }

        if let Some(variants) = &input.variants {
            let old_variant_ids: Vec<Uuid> = ProductVariant::find()
                .filter(product_variant::Column::ProductId.eq(product_id))
                .all(&txn)
                .await?
                .into_iter()
                .map(|v| v.id)
                .collect();
            if !old_variant_ids.is_empty() {
                VariantOptionValue::delete_many()
                    .filter(
                        variant_option_value::Column::VariantId.is_in(old_variant_ids.clone()),
                    )
                    .exec(&txn)
                    .await?;
                ProductVariant::delete_many()
                    .filter(product_variant::Column::Id.is_in(old_variant_ids))
                    .exec(&txn)
                    .await?;
            }
            insert_variants(&txn, product_id, variants).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(product_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;
        Ok(())
    }

    /// Flips the availability flag and returns the new value
    #[instrument(skip(self))]
    pub async fn toggle_availability(&self, product_id: Uuid) -> Result<bool, ServiceError> {
        let existing = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let next = !existing.is_available;
        let mut update: product::ActiveModel = existing.into();
        update.is_available = Set(next);
        update.updated_at = Set(Utc::now());
        update.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;
        Ok(next)
    }

    /// The product page payload: product, images, and variants with
    /// their option attributes
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductDetails, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let images = ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db)
            .await?;

        let variants = self.variants_with_attributes(product_id).await?;

        Ok(ProductDetails {
            product,
            images,
            variants,
        })
    }

    /// Products of one store, newest first, for the seller dashboard
    pub async fn list_store_products(
        &self,
        store_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let paginator = Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Available products across all stores for the storefront, with a
    /// price range derived from each product's variants
    pub async fn list_available_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductListing>, u64), ServiceError> {
        let paginator = Product::find()
            .filter(product::Column::IsAvailable.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut listings = Vec::with_capacity(products.len());
        for product in products {
            let variants = ProductVariant::find()
                .filter(product_variant::Column::ProductId.eq(product.id))
                .all(&*self.db)
                .await?;
            let (min_price, max_price) = price_range(&product, &variants);

            let thumbnail_url = ProductImage::find()
                .filter(product_image::Column::ProductId.eq(product.id))
                .order_by_asc(product_image::Column::Position)
                .one(&*self.db)
                .await?
                .map(|img| img.url);

            listings.push(ProductListing {
                product,
                min_price,
                max_price,
                thumbnail_url,
            });
        }

        Ok((listings, total))
    }

    /// Loads a product's variants in the shape the resolver consumes
    pub async fn resolvable_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ResolvableVariant>, ServiceError> {
        let variants = self.variants_with_attributes(product_id).await?;
        Ok(variants
            .into_iter()
            .map(|v| ResolvableVariant {
                id: v.variant.id,
                sku: v.variant.sku,
                price: v.variant.price,
                stock: v.variant.stock,
                attributes: v.attributes,
            })
            .collect())
    }

    /// Resolves a (possibly partial) selection against a product's
    /// variants. `Ok(None)` means "no determinate match yet"; corrupt
    /// catalog data (two variants with the same combination) surfaces
    /// as a conflict.
    #[instrument(skip(self, selection))]
    pub async fn resolve_selection(
        &self,
        product_id: Uuid,
        selection: &HashMap<String, String>,
    ) -> Result<Option<ResolvedSelection>, ServiceError> {
        let variants = self.resolvable_variants(product_id).await?;

        let resolved = variant_resolver::resolve(&variants, selection).map_err(|e| match e {
            VariantResolveError::AmbiguousSelection => {
                ServiceError::Conflict("catalog data is inconsistent for this product".to_string())
            }
        })?;

        Ok(resolved.map(|variant| ResolvedSelection {
            variant_id: variant.id,
            sku: variant.sku.clone(),
            price: variant.price,
            stock: variant.stock,
            in_stock: variant.in_stock(),
            label: variant.attributes_label(),
        }))
    }

    /// Seeds the default selection (first value per axis) for a product
    pub async fn default_selection(
        &self,
        product_id: Uuid,
    ) -> Result<HashMap<String, String>, ServiceError> {
        let variants = self.resolvable_variants(product_id).await?;
        Ok(variant_resolver::default_selection(&variants))
    }

    async fn variants_with_attributes(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<VariantDetails>, ServiceError> {
        let variants = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(variants.len());
        for variant in variants {
            let values: Vec<(
                crate::entities::ProductOptionValueModel,
                Option<crate::entities::ProductOptionModel>,
            )> = ProductOptionValue::find()
                .join(
                    sea_orm::JoinType::InnerJoin,
                    product_option_value::Relation::VariantLinks.def(),
                )
                .filter(variant_option_value::Column::VariantId.eq(variant.id))
                .find_also_related(ProductOption)
                .order_by_asc(product_option::Column::CreatedAt)
                .all(&*self.db)
                .await?;

            let attributes = values
                .into_iter()
                .filter_map(|(value, option)| option.map(|o| (o.name, value.value)))
                .collect();

            details.push(VariantDetails {
                variant,
                attributes,
            });
        }

        Ok(details)
    }
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
) -> Result<(), ServiceError> {
    for (position, url) in urls.iter().enumerate() {
        let image = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(url.clone()),
            position: Set(position as i32),
            created_at: Set(Utc::now()),
        };
        image.insert(conn).await?;
    }
    Ok(())
}

async fn insert_variants<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    variants: &[CreateVariantInput],
) -> Result<(), ServiceError> {
    for input in variants {
        if input.sku.trim().is_empty() {
            return Err(ServiceError::ValidationError("SKU is required".to_string()));
        }
        if input.stock < 0 {
            return Err(ServiceError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        // Exactly one value per distinct option axis
        let values = ProductOptionValue::find()
            .filter(product_option_value::Column::Id.is_in(input.option_value_ids.clone()))
            .all(conn)
            .await?;
        if values.len() != input.option_value_ids.len() {
            return Err(ServiceError::ValidationError(
                "Unknown option value referenced by variant".to_string(),
            ));
        }
        let distinct_axes: HashSet<Uuid> = values.iter().map(|v| v.option_id).collect();
        if distinct_axes.len() != values.len() {
            return Err(ServiceError::ValidationError(
                "A variant may carry at most one value per option".to_string(),
            ));
        }

        let variant_id = Uuid::new_v4();
        let variant = product_variant::ActiveModel {
            id: Set(variant_id),
            product_id: Set(product_id),
            sku: Set(input.sku.trim().to_string()),
            price: Set(input.price),
            stock: Set(input.stock),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        variant.insert(conn).await?;

        for value_id in &input.option_value_ids {
            let link = variant_option_value::ActiveModel {
                variant_id: Set(variant_id),
                option_value_id: Set(*value_id),
            };
            link.insert(conn).await?;
        }
    }
    Ok(())
}

fn price_range(product: &ProductModel, variants: &[ProductVariantModel]) -> (Decimal, Decimal) {
    let mut prices: Vec<Decimal> = variants.iter().map(|v| v.price).collect();
    if prices.is_empty() {
        return (product.base_price, product.base_price);
    }
    prices.sort();
    (prices[0], prices[prices.len() - 1])
}
