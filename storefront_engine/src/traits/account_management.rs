use thiserror::Error;

use crate::db_types::{CashbackTransaction, Order, OrderDetails, OrderId, PaymentStatus, TelegramId, User};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid query: {0}")]
    QueryError(String),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("{0} does not have permission to view this resource")]
    Unauthorized(TelegramId),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries over orders, users and the cashback ledger.
#[allow(async_fn_in_trait)]
pub trait AccountManagement: Clone {
    async fn fetch_order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, AccountApiError>;

    /// All orders placed by the given identity, newest first.
    async fn fetch_orders_for_customer(&self, telegram_id: TelegramId) -> Result<Vec<OrderDetails>, AccountApiError>;

    /// All orders whose payment status is one of `statuses`, most recently updated first.
    async fn fetch_orders_by_payment_status(&self, statuses: &[PaymentStatus]) -> Result<Vec<Order>, AccountApiError>;

    async fn fetch_user(&self, telegram_id: TelegramId) -> Result<Option<User>, AccountApiError>;

    /// The cashback ledger for the given identity, newest first. Empty if the user does not exist.
    async fn fetch_cashback_history(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Vec<CashbackTransaction>, AccountApiError>;
}
