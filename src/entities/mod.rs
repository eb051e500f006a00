pub mod buyer;
pub mod buyer_address;
pub mod category;
pub mod category_option;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod product_option;
pub mod product_option_value;
pub mod product_variant;
pub mod review;
pub mod store;
pub mod variant_option_value;

// Re-export entities
pub use buyer::{Entity as Buyer, Model as BuyerModel};
pub use buyer_address::{Entity as BuyerAddress, Model as BuyerAddressModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use category_option::Entity as CategoryOption;
pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_option::{Entity as ProductOption, Model as ProductOptionModel};
pub use product_option_value::{Entity as ProductOptionValue, Model as ProductOptionValueModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use store::{Entity as Store, Model as StoreModel};
pub use variant_option_value::Entity as VariantOptionValue;
