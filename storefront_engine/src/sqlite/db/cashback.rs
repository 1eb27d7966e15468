use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{CashbackTransaction, OrderId, Tenge, TelegramId};

pub const EARNED: &str = "earned";

/// Adds `amount` to the user's cashback balance and appends the matching audit row.
///
/// This is not atomic on its own. Call it inside a transaction (passing `&mut *tx`) so that the balance and the ledger
/// can never disagree.
pub async fn credit_cashback(
    user_id: i64,
    order_id: OrderId,
    amount: Tenge,
    conn: &mut SqliteConnection,
) -> Result<CashbackTransaction, sqlx::Error> {
    sqlx::query("UPDATE users SET cashback_balance = cashback_balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(amount.value())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    let tx: CashbackTransaction = sqlx::query_as(
        r#"
        INSERT INTO cashback_transactions (user_id, order_id, amount, type, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(order_id.value())
    .bind(amount.value())
    .bind(EARNED)
    .bind(format!("Cashback for order {order_id}"))
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Cashback transaction #{} recorded: {amount} for user #{user_id}", tx.id);
    Ok(tx)
}

pub async fn fetch_history(
    telegram_id: TelegramId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CashbackTransaction>, sqlx::Error> {
    let history = sqlx::query_as(
        r#"
        SELECT cashback_transactions.* FROM cashback_transactions
        JOIN users ON cashback_transactions.user_id = users.id
        WHERE users.telegram_id = $1
        ORDER BY cashback_transactions.created_at DESC, cashback_transactions.id DESC
        "#,
    )
    .bind(telegram_id.value())
    .fetch_all(conn)
    .await?;
    Ok(history)
}
