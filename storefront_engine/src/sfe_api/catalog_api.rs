use std::fmt::Debug;

use log::{debug, info};

use crate::{
    db_types::{NewProduct, Product, ProductDetails},
    order_objects::ProductQueryFilter,
    traits::{CatalogError, CatalogManagement},
};

/// Catalog reads for the storefront, and product creation for operators.
#[derive(Clone)]
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError> {
        if matches!(filter.limit, Some(l) if l <= 0) {
            return Err(CatalogError::Validation("limit must be positive".into()));
        }
        debug!("🗃️ Fetching products. {filter}");
        self.db.fetch_products(filter).await
    }

    pub async fn product(&self, id: i64) -> Result<ProductDetails, CatalogError> {
        self.db.fetch_product(id).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<ProductDetails, CatalogError> {
        validate_new_product(&product)?;
        let details = self.db.insert_product(product).await?;
        info!(
            "🗃️ Product #{} '{}' added with {} variants",
            details.product.id,
            details.product.name,
            details.variants.len()
        );
        Ok(details)
    }
}

fn validate_new_product(product: &NewProduct) -> Result<(), CatalogError> {
    if product.name.trim().is_empty() {
        return Err(CatalogError::Validation("Product name is required".into()));
    }
    if product.price.value() < 0 || product.sale_price.map(|p| p.value() < 0).unwrap_or(false) {
        return Err(CatalogError::Validation("Prices cannot be negative".into()));
    }
    if let Some(v) = product.variants.iter().find(|v| v.stock_quantity < 0) {
        return Err(CatalogError::Validation(format!("Stock for {} / {} cannot be negative", v.size, v.color)));
    }
    Ok(())
}
