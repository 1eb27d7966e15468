//! Transport-neutral shapes of the bot events the engine consumes.
use std::{fmt::Display, str::FromStr};

use thiserror::Error;

use crate::db_types::{OrderId, TelegramId};

/// The action encoded in an inline button's callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `paid_{order}`: the customer says they have paid.
    MarkPaid(OrderId),
    /// `confirm_payment_{order}`: an operator approves the payment.
    ConfirmPayment(OrderId),
    /// `reject_payment_{order}`: an operator rejects the payment.
    RejectPayment(OrderId),
}

impl CallbackAction {
    pub fn order_id(&self) -> OrderId {
        match self {
            CallbackAction::MarkPaid(id) | CallbackAction::ConfirmPayment(id) | CallbackAction::RejectPayment(id) => *id,
        }
    }
}

impl Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackAction::MarkPaid(id) => write!(f, "paid_{id}"),
            CallbackAction::ConfirmPayment(id) => write!(f, "confirm_payment_{id}"),
            CallbackAction::RejectPayment(id) => write!(f, "reject_payment_{id}"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unrecognised callback data: {0}")]
pub struct CallbackParseError(String);

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_id = |id: &str| id.parse::<OrderId>().map_err(|_| CallbackParseError(s.to_string()));
        if let Some(id) = s.strip_prefix("confirm_payment_") {
            Ok(CallbackAction::ConfirmPayment(parse_id(id)?))
        } else if let Some(id) = s.strip_prefix("reject_payment_") {
            Ok(CallbackAction::RejectPayment(parse_id(id)?))
        } else if let Some(id) = s.strip_prefix("paid_") {
            Ok(CallbackAction::MarkPaid(parse_id(id)?))
        } else {
            Err(CallbackParseError(s.to_string()))
        }
    }
}

/// A message the bot sent earlier, identified well enough to edit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: TelegramId,
    pub message_id: i64,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// The `/start` command.
    Start { chat: TelegramId },
    /// An inline button was tapped. `action` is `None` when the callback data is not one of ours; the tap is still
    /// acknowledged.
    ButtonTap { callback_id: String, from: TelegramId, action: Option<CallbackAction>, origin: Option<MessageRef> },
    /// A photo was sent to the bot. `file_id` refers to the largest rendition.
    Photo { from: TelegramId, file_id: String },
}

/// What the engine did with a bot event.
#[derive(Debug, Clone)]
pub enum BotOutcome {
    Greeted,
    Flow(crate::order_objects::FlowOutcome),
    /// The event was understood but declined (not authorized, wrong state, unknown order). The user was told why.
    Declined(String),
    /// Nothing to do, e.g. a photo with no order waiting for it.
    Ignored,
}
