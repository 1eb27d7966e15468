use log::trace;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductDetails, ProductVariant},
    order_objects::ProductQueryFilter,
};

/// Fetches in-stock products according to the filter, newest first.
pub async fn search_products(
    filter: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE in_stock = 1");
    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category);
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ");
        builder.push_bind(featured);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("📝️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<ProductDetails>, sqlx::Error> {
    let product: Option<Product> =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    let product = match product {
        Some(p) => p,
        None => return Ok(None),
    };
    let variants = fetch_variants(id, conn).await?;
    Ok(Some(ProductDetails { product, variants }))
}

pub async fn fetch_variants(product_id: i64, conn: &mut SqliteConnection) -> Result<Vec<ProductVariant>, sqlx::Error> {
    let variants = sqlx::query_as("SELECT * FROM product_variants WHERE product_id = $1 ORDER BY id")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(variants)
}

/// Inserts a product and its variants. Embed it in a transaction so that a failing variant also removes the product.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<ProductDetails, sqlx::Error> {
    let row: Product = sqlx::query_as(
        r#"
        INSERT INTO products (name, description, price, sale_price, category, images, featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.value())
    .bind(product.sale_price.map(|p| p.value()))
    .bind(&product.category)
    .bind(Json(&product.images))
    .bind(product.featured)
    .fetch_one(&mut *conn)
    .await?;
    let mut variants = Vec::with_capacity(product.variants.len());
    for v in &product.variants {
        let variant: ProductVariant = sqlx::query_as(
            r#"
            INSERT INTO product_variants (product_id, size, color, stock_quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(&v.size)
        .bind(&v.color)
        .bind(v.stock_quantity)
        .fetch_one(&mut *conn)
        .await?;
        variants.push(variant);
    }
    Ok(ProductDetails { product: row, variants })
}
