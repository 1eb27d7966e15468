//! Delivers the order flow's notifications through the Telegram Bot API.
use log::*;
use storefront_engine::{
    db_types::TelegramId,
    traits::{Button, ButtonAction},
    Notifier,
    NotifierError,
};
use telegram_tools::{InlineKeyboardButton, InlineKeyboardMarkup, TelegramApi, TelegramApiError};

#[derive(Clone)]
pub struct TelegramNotifier {
    api: TelegramApi,
}

impl TelegramNotifier {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }
}

/// Renders the buttons as a single-row inline keyboard. No buttons means no keyboard at all.
pub fn keyboard_for(buttons: &[Button]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    let row = buttons
        .iter()
        .map(|b| match &b.action {
            ButtonAction::Callback(action) => InlineKeyboardButton::callback(&b.text, action.to_string()),
            ButtonAction::WebApp(url) => InlineKeyboardButton::web_app(&b.text, url),
        })
        .collect();
    Some(InlineKeyboardMarkup::single_row(row))
}

fn delivery_failed(chat: TelegramId, e: TelegramApiError) -> NotifierError {
    debug!("📬️ Telegram call for chat {chat} failed. {e}");
    NotifierError::DeliveryFailed { chat, reason: e.to_string() }
}

impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat: TelegramId, text: &str, buttons: &[Button]) -> Result<(), NotifierError> {
        let keyboard = keyboard_for(buttons);
        self.api.send_message(chat.value(), text, keyboard.as_ref()).await.map_err(|e| delivery_failed(chat, e))?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: TelegramId,
        photo: &str,
        caption: &str,
        buttons: &[Button],
    ) -> Result<(), NotifierError> {
        let keyboard = keyboard_for(buttons);
        self.api
            .send_photo(chat.value(), photo, caption, keyboard.as_ref())
            .await
            .map_err(|e| delivery_failed(chat, e))?;
        Ok(())
    }

    async fn edit_caption(&self, chat: TelegramId, message_id: i64, caption: &str) -> Result<(), NotifierError> {
        self.api.edit_message_caption(chat.value(), message_id, caption).await.map_err(|e| delivery_failed(chat, e))
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), NotifierError> {
        self.api.answer_callback_query(callback_id, text, show_alert).await.map_err(|e| {
            debug!("📬️ Could not answer callback query {callback_id}. {e}");
            NotifierError::CallbackFailed(callback_id.to_string())
        })
    }
}
