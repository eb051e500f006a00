pub mod checkout_service;
pub mod customer_service;
pub mod product_catalog_service;
pub mod variant_resolver;

pub use checkout_service::{BuyerIdentity, CheckoutService, PlacedOrder, ShippingAddressInput};
pub use customer_service::CustomerService;
pub use product_catalog_service::{
    CreateProductInput, CreateVariantInput, ProductCatalogService, UpdateProductInput,
};
pub use variant_resolver::{ResolvableVariant, VariantResolveError};
