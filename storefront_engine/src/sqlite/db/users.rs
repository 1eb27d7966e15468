use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, TelegramId, User};

pub async fn fetch_user(telegram_id: TelegramId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE telegram_id = $1")
        .bind(telegram_id.value())
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Returns the user record for the customer, creating it if this is their first order.
pub async fn fetch_or_create_user(customer: &Customer, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    if let Some(user) = fetch_user(customer.id(), conn).await? {
        return Ok(user);
    }
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (telegram_id, username, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(customer.telegram_id)
    .bind(&customer.username)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Created user #{} for {}", user.id, user.telegram_id);
    Ok(user)
}
