//! The payment state machine.
//!
//! ```text
//!   unpaid ──MarkPaid──▶ screenshot_awaited ──SubmitScreenshot──▶ verification ──Approve──▶ paid
//!                                                                      └────────Reject───▶ failed
//! ```
//!
//! [`transition`] is a pure function of the current order, the event and the acting identity. It decides the new
//! state and lists the side effects that must follow, but performs none of them. The same function serves the HTTP
//! gateway and the bot webhook, so both entry points have identical semantics.
//!
//! `paid` and `failed` are terminal. Any event on a settled order (by an actor that is allowed to send it) is a no-op,
//! reported as [`Decision::AlreadySettled`].
use std::fmt::Display;

use crate::{
    db_types::{Order, OrderId, OrderStatus, PaymentStatus, Tenge, TelegramId},
    traits::StorefrontError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// The customer says they have transferred the money.
    MarkPaid,
    /// The customer uploaded a receipt screenshot. `photo` is the messaging platform's file reference.
    SubmitScreenshot { photo: String },
    /// An operator accepted the payment.
    Approve,
    /// An operator rejected the payment.
    Reject,
}

impl Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEvent::MarkPaid => f.write_str("mark_paid"),
            PaymentEvent::SubmitScreenshot { .. } => f.write_str("submit_screenshot"),
            PaymentEvent::Approve => f.write_str("approve"),
            PaymentEvent::Reject => f.write_str("reject"),
        }
    }
}

/// Who is driving the event. `is_operator` has already been resolved against the operator policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: TelegramId,
    pub is_operator: bool,
}

impl Actor {
    pub fn customer(id: TelegramId) -> Self {
        Self { id, is_operator: false }
    }

    pub fn operator(id: TelegramId) -> Self {
        Self { id, is_operator: true }
    }
}

/// Messages the engine must send after a transition commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Ask the customer for a receipt screenshot.
    ScreenshotPrompt { chat: TelegramId },
    /// Tell the customer that their screenshot is being reviewed.
    ScreenshotReceived { chat: TelegramId, cashback: Tenge },
    /// Ask every operator to review the screenshot.
    ReviewRequest {
        order_id: OrderId,
        order_number: i64,
        total: Tenge,
        phone: String,
        delivery_address: String,
        photo: String,
    },
    PaymentConfirmed { chat: TelegramId, order_number: i64, cashback: Tenge },
    PaymentRejected { chat: TelegramId, order_number: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Credit `amount` to the user's cashback balance and append an "earned" audit row. Always applied atomically with
    /// the status change that produced it.
    CreditCashback { user_id: i64, order_id: OrderId, amount: Tenge },
    Notify(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    /// The fulfillment status that accompanies the new payment status, if it changes.
    pub order_status: Option<OrderStatus>,
    /// The receipt screenshot to record with the transition.
    pub screenshot: Option<String>,
    pub effects: Vec<SideEffect>,
}

impl Transition {
    fn new(from: PaymentStatus, to: PaymentStatus) -> Self {
        Self { from, to, order_status: None, screenshot: None, effects: Vec::new() }
    }

    fn with_order_status(mut self, status: OrderStatus) -> Self {
        self.order_status = Some(status);
        self
    }

    fn with_screenshot(mut self, photo: String) -> Self {
        self.screenshot = Some(photo);
        self
    }

    fn with_effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The cashback credit that must be committed together with this transition, if any.
    pub fn cashback_credit(&self) -> Option<(i64, Tenge)> {
        self.effects.iter().find_map(|e| match e {
            SideEffect::CreditCashback { user_id, amount, .. } => Some((*user_id, *amount)),
            SideEffect::Notify(_) => None,
        })
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        notices(&self.effects)
    }
}

pub(crate) fn notices(effects: &[SideEffect]) -> impl Iterator<Item = &Notice> {
    effects.iter().filter_map(|e| match e {
        SideEffect::Notify(n) => Some(n),
        SideEffect::CreditCashback { .. } => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Move to a new state and perform the side effects.
    Advance(Transition),
    /// Stay in the current state, but perform the side effects again (e.g. re-send a prompt).
    Repeat(Vec<SideEffect>),
    /// The payment is already settled. Nothing happens.
    AlreadySettled,
}

/// Decide what `event`, sent by `actor`, does to `order`.
///
/// Authorization is checked before the current state is considered, so an unauthorized actor always gets an error,
/// even on a settled order.
pub fn transition(order: &Order, event: &PaymentEvent, actor: &Actor) -> Result<Decision, StorefrontError> {
    use PaymentStatus::*;
    match event {
        PaymentEvent::Approve | PaymentEvent::Reject if !actor.is_operator => {
            return Err(StorefrontError::Unauthorized(actor.id))
        },
        PaymentEvent::MarkPaid | PaymentEvent::SubmitScreenshot { .. } if actor.id != order.telegram_id => {
            return Err(StorefrontError::Unauthorized(actor.id))
        },
        _ => {},
    }
    if order.payment_status.is_terminal() {
        return Ok(Decision::AlreadySettled);
    }
    let from = order.payment_status;
    let chat = order.telegram_id;
    let decision = match (from, event) {
        (Unpaid, PaymentEvent::MarkPaid) => Decision::Advance(
            Transition::new(from, ScreenshotAwaited)
                .with_effect(SideEffect::Notify(Notice::ScreenshotPrompt { chat })),
        ),
        (ScreenshotAwaited, PaymentEvent::MarkPaid) => {
            Decision::Repeat(vec![SideEffect::Notify(Notice::ScreenshotPrompt { chat })])
        },
        (ScreenshotAwaited, PaymentEvent::SubmitScreenshot { photo }) => Decision::Advance(
            Transition::new(from, Verification)
                .with_screenshot(photo.clone())
                .with_effect(SideEffect::Notify(Notice::ScreenshotReceived { chat, cashback: order.cashback_earned }))
                .with_effect(SideEffect::Notify(Notice::ReviewRequest {
                    order_id: order.id,
                    order_number: order.order_number,
                    total: order.total_amount,
                    phone: order.phone.clone(),
                    delivery_address: order.delivery_address.clone(),
                    photo: photo.clone(),
                })),
        ),
        (Verification, PaymentEvent::Approve) => Decision::Advance(
            Transition::new(from, Paid)
                .with_order_status(OrderStatus::Confirmed)
                .with_effect(SideEffect::CreditCashback {
                    user_id: order.user_id,
                    order_id: order.id,
                    amount: order.cashback_earned,
                })
                .with_effect(SideEffect::Notify(Notice::PaymentConfirmed {
                    chat,
                    order_number: order.order_number,
                    cashback: order.cashback_earned,
                })),
        ),
        (Verification, PaymentEvent::Reject) => Decision::Advance(
            Transition::new(from, Failed)
                .with_order_status(OrderStatus::Cancelled)
                .with_effect(SideEffect::Notify(Notice::PaymentRejected { chat, order_number: order.order_number })),
        ),
        (from, event) => {
            return Err(StorefrontError::TransitionNotAllowed { order_id: order.id, from, event: event.to_string() })
        },
    };
    Ok(decision)
}
