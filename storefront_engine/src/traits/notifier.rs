use thiserror::Error;

use crate::{bot_objects::CallbackAction, db_types::TelegramId};

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Could not deliver message to {chat}: {reason}")]
    DeliveryFailed { chat: TelegramId, reason: String },
    #[error("Could not acknowledge callback {0}")]
    CallbackFailed(String),
    #[error("Notifier is not available: {0}")]
    Unavailable(String),
}

/// What an inline button does when tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Sends the action back to the bot as callback data.
    Callback(CallbackAction),
    /// Opens the web app at the given URL.
    WebApp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback<S: Into<String>>(text: S, action: CallbackAction) -> Self {
        Self { text: text.into(), action: ButtonAction::Callback(action) }
    }

    pub fn web_app<S: Into<String>, U: Into<String>>(text: S, url: U) -> Self {
        Self { text: text.into(), action: ButtonAction::WebApp(url.into()) }
    }
}

/// One-way outbound messaging to a chat identity. Buttons are rendered on a single row under the message.
///
/// Implementations have no knowledge of orders. Every call is best-effort from the engine's point of view: a failure
/// is logged and never undoes the state change that prompted it.
#[allow(async_fn_in_trait)]
pub trait Notifier: Clone {
    async fn send_message(&self, chat: TelegramId, text: &str, buttons: &[Button]) -> Result<(), NotifierError>;

    /// Sends a photo the messaging platform already holds, identified by `photo`.
    async fn send_photo(
        &self,
        chat: TelegramId,
        photo: &str,
        caption: &str,
        buttons: &[Button],
    ) -> Result<(), NotifierError>;

    /// Replaces the caption of a message that was sent earlier, removing its buttons.
    async fn edit_caption(&self, chat: TelegramId, message_id: i64, caption: &str) -> Result<(), NotifierError>;

    /// Acknowledges a button tap, optionally showing `text` to the user (as an alert if `show_alert` is set).
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, show_alert: bool)
        -> Result<(), NotifierError>;
}
