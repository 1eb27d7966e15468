use thiserror::Error;

use crate::{
    db_types::{NewProduct, Product, ProductDetails},
    order_objects::ProductQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("Invalid product: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(de) if de.is_unique_violation() => CatalogError::Validation(de.message().to_string()),
            _ => CatalogError::DatabaseError(e.to_string()),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    /// In-stock products matching the filter, newest first.
    async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<ProductDetails>, CatalogError>;

    /// Inserts the product and all of its variants atomically.
    async fn insert_product(&self, product: NewProduct) -> Result<ProductDetails, CatalogError>;
}
