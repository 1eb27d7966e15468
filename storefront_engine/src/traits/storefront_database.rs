use thiserror::Error;

use crate::{
    db_types::{Order, OrderDetails, OrderId, PaymentStatus, PricedOrder, PricedVariant, TelegramId},
    state_machine::Transition,
    traits::AccountManagement,
};

#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Item out of stock: {item}")]
    OutOfStock { item: String },
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("{0} is not allowed to perform this action")]
    Unauthorized(TelegramId),
    #[error("Order {order_id} cannot handle '{event}' while its payment status is {from}")]
    TransitionNotAllowed { order_id: OrderId, from: PaymentStatus, event: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the storefront engine.
///
/// This behaviour includes:
/// * Looking up variants for pricing and stock checks
/// * Persisting new orders while atomically reserving their stock
/// * Conditional payment-status transitions, including crediting cashback when a payment is approved
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the variant identified by `(product_id, size, color)` together with its parent product's pricing.
    async fn fetch_priced_variant(
        &self,
        product_id: i64,
        size: &str,
        color: &str,
    ) -> Result<Option<PricedVariant>, StorefrontError>;

    /// In a single atomic transaction:
    /// * decrements stock for every line, failing with [`StorefrontError::OutOfStock`] (and rolling everything back)
    ///   if any variant cannot cover the requested quantity,
    /// * fetches or creates the user record for the customer,
    /// * inserts the order with the next sequential order number, and its line items.
    ///
    /// Returns the new order with its items.
    async fn insert_order_reserving_stock(&self, order: PricedOrder) -> Result<OrderDetails, StorefrontError>;

    /// Fetches an order by id.
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StorefrontError>;

    /// Fetches the most recently created order for the given identity that is waiting for a payment screenshot.
    async fn fetch_latest_awaiting_screenshot(&self, telegram_id: TelegramId) -> Result<Option<Order>, StorefrontError>;

    /// Applies the transition, if and only if the order's payment status is still `transition.from`.
    ///
    /// If the transition carries a cashback credit, the user's balance is incremented and the audit row is written in
    /// the same database transaction as the status change.
    ///
    /// Returns the updated order, or `None` if the order was no longer in the expected state. In that case nothing
    /// is changed.
    async fn apply_transition(&self, id: OrderId, transition: &Transition) -> Result<Option<Order>, StorefrontError>;
}
