use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sf_common::Secret;
use storefront_engine::{
    db_types::{Customer, NewOrder, OrderLineRequest},
    order_objects::VerifyDecision,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The body of `POST /api/orders`. The customer is taken from the caller's init data, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub delivery_address: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_new_order(self, customer: Customer) -> NewOrder {
        NewOrder {
            customer,
            items: self.items,
            delivery_address: self.delivery_address,
            phone: self.phone,
            notes: self.notes,
        }
    }
}

/// The body of `POST /api/payments/{id}/verify`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub status: VerifyDecision,
}

/// The secret token Telegram must present on webhook calls. `None` accepts every call.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecret(pub Option<Secret<String>>);

impl WebhookSecret {
    pub fn accepts(&self, token: Option<&str>) -> bool {
        match (&self.0, token) {
            (None, _) => true,
            (Some(secret), Some(token)) => secret.reveal() == token,
            (Some(_), None) => false,
        }
    }
}
