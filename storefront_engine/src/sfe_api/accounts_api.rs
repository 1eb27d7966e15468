//! Read-only API over orders, user profiles and the cashback ledger.

use std::{fmt::Debug, sync::Arc};

use log::{debug, trace};

use crate::{
    db_types::{CashbackTransaction, Order, OrderDetails, OrderId, PaymentStatus, TelegramId},
    helpers::{PaymentInstructions, PaymentTarget},
    order_objects::{OrderView, UserProfile},
    traits::{AccountApiError, AccountManagement, OperatorPolicy},
};

/// The `AccountApi` answers customers' and operators' questions about orders and balances. It never changes state.
pub struct AccountApi<B> {
    db: B,
    policy: Arc<dyn OperatorPolicy>,
    payment_target: PaymentTarget,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B: Clone> Clone for AccountApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), policy: Arc::clone(&self.policy), payment_target: self.payment_target.clone() }
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B, policy: Arc<dyn OperatorPolicy>, payment_target: PaymentTarget) -> Self {
        Self { db, policy, payment_target }
    }

    pub fn is_operator(&self, id: TelegramId) -> bool {
        self.policy.is_operator(id)
    }

    /// Fetches a single order with its payment instructions.
    ///
    /// Only the order's owner and operators may see it. Everyone else gets [`AccountApiError::OrderNotFound`], so
    /// that order ids cannot be probed.
    pub async fn order_for(&self, requester: TelegramId, order_id: OrderId) -> Result<OrderView, AccountApiError> {
        let order = self.db.fetch_order_details(order_id).await?.ok_or(AccountApiError::OrderNotFound(order_id))?;
        if order.order.telegram_id != requester && !self.is_operator(requester) {
            debug!("🗃️ {requester} asked for order {order_id}, which belongs to {}", order.order.telegram_id);
            return Err(AccountApiError::OrderNotFound(order_id));
        }
        let payment_data = PaymentInstructions::new(&order.order, &self.payment_target);
        Ok(OrderView { order, payment_data })
    }

    /// All orders placed by `customer`, newest first.
    pub async fn orders_for(&self, customer: TelegramId) -> Result<Vec<OrderDetails>, AccountApiError> {
        let orders = self.db.fetch_orders_for_customer(customer).await?;
        trace!("🗃️ {} orders found for {customer}", orders.len());
        Ok(orders)
    }

    /// Orders that are waiting on the customer's screenshot or an operator's decision, most recently updated first.
    pub async fn pending_payments(&self, operator: TelegramId) -> Result<Vec<Order>, AccountApiError> {
        if !self.is_operator(operator) {
            return Err(AccountApiError::Unauthorized(operator));
        }
        self.db.fetch_orders_by_payment_status(&PaymentStatus::pending()).await
    }

    /// The customer's profile. Customers who have never ordered get an empty profile.
    pub async fn profile(
        &self,
        customer: TelegramId,
        first_name: Option<String>,
    ) -> Result<UserProfile, AccountApiError> {
        let profile = match self.db.fetch_user(customer).await? {
            Some(user) => UserProfile::Registered(user),
            None => UserProfile::guest(customer, first_name),
        };
        Ok(profile)
    }

    /// The customer's cashback ledger, newest first.
    pub async fn cashback_history(&self, customer: TelegramId) -> Result<Vec<CashbackTransaction>, AccountApiError> {
        self.db.fetch_cashback_history(customer).await
    }
}
