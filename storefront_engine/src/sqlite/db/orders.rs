use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Order, OrderDetails, OrderId, OrderItem, PaymentStatus, PricedOrder, TelegramId},
    state_machine::Transition,
};

/// Inserts the order and its line items for the given user, assigning the next sequential order number
/// (starting at 1001). This is not atomic. You can embed this call inside a transaction if you need to ensure
/// atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    user_id: i64,
    order: &PricedOrder,
    conn: &mut SqliteConnection,
) -> Result<OrderDetails, sqlx::Error> {
    let new_order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                telegram_id,
                total_amount,
                cashback_earned,
                delivery_address,
                phone,
                notes
            ) VALUES ((SELECT COALESCE(MAX(order_number), 1000) + 1 FROM orders), $1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(order.customer.telegram_id)
    .bind(order.total_amount.value())
    .bind(order.cashback_earned.value())
    .bind(&order.delivery_address)
    .bind(&order.phone)
    .bind(&order.notes)
    .fetch_one(&mut *conn)
    .await?;
    let mut items = Vec::with_capacity(order.lines.len());
    for line in &order.lines {
        let item: OrderItem = sqlx::query_as(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, size, color, quantity, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
            "#,
        )
        .bind(new_order.id.value())
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(&line.size)
        .bind(&line.color)
        .bind(line.quantity)
        .bind(line.unit_price.value())
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }
    debug!("📝️ Order #{} inserted with id {} and {} items", new_order.order_number, new_order.id, items.len());
    Ok(OrderDetails { order: new_order, items })
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.value()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_items(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(id.value()).fetch_all(conn).await?;
    Ok(items)
}

pub async fn fetch_order_details(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderDetails>, sqlx::Error> {
    let order = match fetch_order(id, conn).await? {
        Some(o) => o,
        None => return Ok(None),
    };
    let items = fetch_items(id, conn).await?;
    Ok(Some(OrderDetails { order, items }))
}

/// Returns all orders for the given identity, newest first.
pub async fn fetch_orders_for_customer(
    telegram_id: TelegramId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE telegram_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(telegram_id.value())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns the most recently created order for the identity that is in the `screenshot_awaited` state.
pub async fn fetch_latest_awaiting_screenshot(
    telegram_id: TelegramId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE telegram_id = $1 AND payment_status = $2
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(telegram_id.value())
    .bind(PaymentStatus::ScreenshotAwaited.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Fetches orders whose payment status is any of `statuses`, most recently updated first.
pub async fn search_by_payment_status(
    statuses: &[PaymentStatus],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE payment_status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(status.to_string());
    }
    builder.push(") ORDER BY updated_at DESC, id DESC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_by_payment_status: {}", orders.len());
    Ok(orders)
}

/// Moves the order along `transition`, but only if its payment status is still `transition.from`.
///
/// The status check and the update are a single statement. If another actor moved the order first, nothing is
/// changed and `None` is returned.
pub async fn update_payment_status(
    id: OrderId,
    transition: &Transition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, payment_status = ");
    builder.push_bind(transition.to.to_string());
    if let Some(status) = transition.order_status {
        builder.push(", status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(screenshot) = &transition.screenshot {
        builder.push(", payment_screenshot = ");
        builder.push_bind(screenshot.clone());
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id.value());
    builder.push(" AND payment_status = ");
    builder.push_bind(transition.from.to_string());
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    trace!("📝️ Result of update_payment_status: {order:?}");
    Ok(order)
}
