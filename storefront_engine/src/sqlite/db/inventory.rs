use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{PricedLine, PricedVariant};

/// Fetches the variant `(product_id, size, color)` joined with its product's name and prices.
pub async fn fetch_priced_variant(
    product_id: i64,
    size: &str,
    color: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PricedVariant>, sqlx::Error> {
    let variant = sqlx::query_as(
        r#"
        SELECT
            product_variants.product_id as product_id,
            products.name as product_name,
            product_variants.size as size,
            product_variants.color as color,
            product_variants.stock_quantity as stock_quantity,
            products.price as price,
            products.sale_price as sale_price
        FROM product_variants JOIN products ON product_variants.product_id = products.id
        WHERE product_variants.product_id = $1 AND product_variants.size = $2 AND product_variants.color = $3
        "#,
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .fetch_optional(conn)
    .await?;
    Ok(variant)
}

/// Decrements the stock of the line's variant by its quantity, if and only if there is enough stock to cover it.
///
/// The check and the decrement are a single statement, so concurrent reservations can never take the stock below
/// zero. Returns `false` (and changes nothing) if the variant is missing or short.
pub async fn reserve_stock(line: &PricedLine, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE product_variants SET stock_quantity = stock_quantity - $1
        WHERE product_id = $2 AND size = $3 AND color = $4 AND stock_quantity >= $1
        "#,
    )
    .bind(line.quantity)
    .bind(line.product_id)
    .bind(&line.size)
    .bind(&line.color)
    .execute(conn)
    .await?;
    let reserved = result.rows_affected() == 1;
    if reserved {
        trace!("🗃️ Reserved {} x {}", line.quantity, line.describe());
    } else {
        debug!("🗃️ Could not reserve {} x {}. Not enough stock.", line.quantity, line.describe());
    }
    Ok(reserved)
}

pub async fn stock_level(
    product_id: i64,
    size: &str,
    color: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let level: Option<(i64,)> = sqlx::query_as(
        "SELECT stock_quantity FROM product_variants WHERE product_id = $1 AND size = $2 AND color = $3",
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .fetch_optional(conn)
    .await?;
    Ok(level.map(|(q,)| q))
}
