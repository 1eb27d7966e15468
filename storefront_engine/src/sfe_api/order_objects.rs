use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderDetails, Tenge, TelegramId, User},
    helpers::PaymentInstructions,
    state_machine::PaymentEvent,
};

/// The result of placing an order: the order itself and how to pay for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order: OrderDetails,
    #[serde(rename = "paymentData")]
    pub payment_data: PaymentInstructions,
    /// Outbound messages that could not be delivered. Never affects the order itself.
    #[serde(skip)]
    pub notifications_failed: usize,
}

/// An order, as shown to its owner or an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order: OrderDetails,
    #[serde(rename = "paymentData")]
    pub payment_data: PaymentInstructions,
}

/// An operator's verdict on a payment screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyDecision {
    Paid,
    Failed,
}

impl VerifyDecision {
    pub fn event(&self) -> PaymentEvent {
        match self {
            VerifyDecision::Paid => PaymentEvent::Approve,
            VerifyDecision::Failed => PaymentEvent::Reject,
        }
    }
}

impl Display for VerifyDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyDecision::Paid => f.write_str("paid"),
            VerifyDecision::Failed => f.write_str("failed"),
        }
    }
}

/// How an event affected an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionResult {
    /// The order moved to a new payment status.
    Applied,
    /// The order stayed where it was, but the event's messages were sent again.
    Repeated,
    /// The order was already settled, or another actor moved it first. Nothing was done.
    NoOp,
}

#[derive(Debug, Clone)]
pub struct FlowOutcome {
    /// The order as it stands after the event.
    pub order: Order,
    pub result: TransitionResult,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl FlowOutcome {
    pub fn no_op(order: Order) -> Self {
        Self { order, result: TransitionResult::NoOp, notifications_sent: 0, notifications_failed: 0 }
    }

    pub fn is_applied(&self) -> bool {
        self.result == TransitionResult::Applied
    }
}

/// The profile returned to a customer. Customers who have never ordered have no user record yet, and see a
/// zero-balance profile instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UserProfile {
    Registered(User),
    Guest { telegram_id: TelegramId, first_name: Option<String>, cashback_balance: Tenge },
}

impl UserProfile {
    pub fn guest(telegram_id: TelegramId, first_name: Option<String>) -> Self {
        Self::Guest { telegram_id, first_name, cashback_balance: Tenge::default() }
    }

    pub fn cashback_balance(&self) -> Tenge {
        match self {
            UserProfile::Registered(u) => u.cashback_balance,
            UserProfile::Guest { cashback_balance, .. } => *cashback_balance,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductQueryFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

impl ProductQueryFilter {
    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured = Some(true);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.featured.is_none() && self.limit.is_none()
    }
}

impl Display for ProductQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(category) = &self.category {
            write!(f, "category: {category}. ")?;
        }
        if let Some(featured) = self.featured {
            write!(f, "featured: {featured}. ")?;
        }
        if let Some(limit) = self.limit {
            write!(f, "limit: {limit}. ")?;
        }
        Ok(())
    }
}
